//! Query module - read-only traversal over the lineage graph

pub mod engine;

pub use engine::{
    AffectedNode, Direction, ImpactReport, LineagePath, PathSearch, SubgraphFilter,
    SubgraphResult, TraversalEngine,
};
