//! # LineageDB - Lineage Graph Engine
//!
//! Dependency-graph core for a data catalog: tracks directed lineage
//! relationships between data assets discovered across external stores.
//!
//! LineageDB provides:
//! - A typed node/edge model for data assets and their dependencies
//! - Structural invariants enforced on every mutation (no self-loops,
//!   no duplicate relationships, no cycles)
//! - SQLite-backed storage with soft deletes and audit fields
//! - Traversal queries: subgraph retrieval, confidence-scored path
//!   finding, downstream impact analysis
//! - A TTL/LRU result cache invalidated on mutation
//! - Bulk node import with per-item error isolation

pub mod cache;
pub mod config;
pub mod edge;
pub mod engine;
pub mod import;
pub mod node;
pub mod query;
pub mod server;
pub mod storage;
pub mod validator;

// Re-exports for convenient access
pub use edge::{Edge, EdgeSpec, RelationshipType};
pub use engine::LineageEngine;
pub use node::{Node, NodeSpec, NodeType, Status};
pub use storage::SqliteStore;

/// Result type alias for LineageDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Depth bound applied to every recursive traversal: cycle probes,
/// path enumeration and impact analysis
pub const MAX_TRAVERSAL_DEPTH: usize = 20;

/// Default result cap for subgraph retrieval
pub const DEFAULT_SUBGRAPH_LIMIT: usize = 1000;

/// Hard result cap for subgraph retrieval
pub const MAX_SUBGRAPH_LIMIT: usize = 10_000;

/// Maximum item count accepted by a single bulk import
pub const MAX_BULK_ITEMS: usize = 1000;

/// Error types for LineageDB operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Cycle detected: {0}")]
    Cycle(String),

    #[error("Self reference: {0}")]
    SelfReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable kind, used by transport layers and bulk
    /// error reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Duplicate(_) => "duplicate",
            Error::Cycle(_) => "cycle",
            Error::SelfReference(_) => "self_reference",
            Error::NotFound(_) => "not_found",
            Error::Storage(_) | Error::Serialization(_) => "engine",
        }
    }

    /// Status-like code so a transport layer can map errors without the
    /// engine knowing about transport
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::SelfReference(_) => 400,
            Error::NotFound(_) => 404,
            Error::Duplicate(_) | Error::Cycle(_) => 409,
            Error::Storage(_) | Error::Serialization(_) => 500,
        }
    }

    /// True for invariant violations and bad input, false for backing
    /// store failures
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Error::Storage(_) | Error::Serialization(_))
    }
}
