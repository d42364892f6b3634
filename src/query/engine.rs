//! Traversal engine implementation
//!
//! Read-only graph algorithms over the store:
//! - Bounded subgraph retrieval with independent node/edge filters
//! - Exhaustive path enumeration with multiplicative confidence scoring
//! - Downstream impact analysis with per-branch cycle safety
//!
//! Edge arrows point at the asset being depended on: a `derives_from`
//! edge runs from the derived asset to its source. Upstream traversal
//! therefore follows arrows, downstream traversal walks them in reverse.

use crate::edge::{Edge, RelationshipType};
use crate::node::{Node, NodeType};
use crate::storage::SqliteStore;
use crate::{DEFAULT_SUBGRAPH_LIMIT, Error, MAX_SUBGRAPH_LIMIT, MAX_TRAVERSAL_DEPTH, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Direction for edge traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the assets this node was built from
    Upstream,
    /// Toward the assets built from this node
    Downstream,
    Both,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "upstream" | "up" => Ok(Direction::Upstream),
            "downstream" | "down" => Ok(Direction::Downstream),
            "both" => Ok(Direction::Both),
            _ => Err(Error::Validation(format!("Unknown direction: {}", s))),
        }
    }
}

/// Filters for subgraph retrieval.
///
/// Node and edge filters apply independently: a returned edge may
/// reference a node outside the returned node set when the type
/// allow-lists disagree. Callers that need a closed subgraph must
/// post-filter on the returned node ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubgraphFilter {
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub node_types: Option<Vec<NodeType>>,
    #[serde(default)]
    pub relationships: Option<Vec<RelationshipType>>,
    /// Result cap per entity kind; defaults to 1000, clamped to 10000
    #[serde(default)]
    pub limit: Option<usize>,
    /// When false, metadata maps are stripped from the results
    #[serde(default)]
    pub include_metadata: bool,
}

/// A filtered slice of the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgraphResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// One directed path between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineagePath {
    /// Visited node ids, start and end inclusive
    pub node_ids: Vec<String>,
    /// Edges walked, in order
    pub edges: Vec<Edge>,
    /// Product of edge confidences along the path
    pub confidence: f32,
}

impl LineagePath {
    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

/// Result of a path search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSearch {
    /// Every non-repeating-node path found within the depth bound
    pub paths: Vec<LineagePath>,
    /// The path with the fewest hops; the first one discovered wins ties
    pub shortest: Option<LineagePath>,
}

/// A node reached by impact analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedNode {
    pub node: Node,
    /// Minimum depth at which the node was discovered
    pub depth: usize,
}

/// Result of downstream impact analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Reached nodes sorted by (depth, label)
    pub affected: Vec<AffectedNode>,
    /// Maximum depth actually reached
    pub impact_radius: usize,
    /// Reached gold-tier nodes, flagged as high criticality
    pub critical_paths: Vec<AffectedNode>,
}

/// Traversal engine for lineage queries
pub struct TraversalEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> TraversalEngine<'a> {
    /// Create a new traversal engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Retrieve a filtered slice of the graph with deterministic ordering:
    /// nodes by (type, label), edges by (from, to).
    pub fn get_subgraph(&self, filter: &SubgraphFilter) -> Result<SubgraphResult> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_SUBGRAPH_LIMIT)
            .min(MAX_SUBGRAPH_LIMIT);

        let mut nodes = self.store.list_nodes(
            filter.data_source.as_deref(),
            filter.node_types.as_deref(),
            limit,
        )?;
        let mut edges = self.store.list_edges(
            filter.data_source.as_deref(),
            filter.relationships.as_deref(),
            limit,
        )?;

        if !filter.include_metadata {
            for node in &mut nodes {
                node.metadata.clear();
            }
            for edge in &mut edges {
                edge.metadata.clear();
            }
        }

        Ok(SubgraphResult { nodes, edges })
    }

    /// Enumerate every non-repeating-node path between `start` and `end`
    /// within `max_depth` hops, following edges according to `direction`.
    ///
    /// Fails fast with NotFound when either endpoint is not an Active
    /// node, so "no path" and "bad input" stay distinguishable.
    pub fn find_paths(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
        direction: Direction,
    ) -> Result<PathSearch> {
        let depth = max_depth.clamp(1, MAX_TRAVERSAL_DEPTH);

        if self.store.get_node(start)?.is_none() {
            return Err(Error::NotFound(format!("node {} not found", start)));
        }
        if self.store.get_node(end)?.is_none() {
            return Err(Error::NotFound(format!("node {} not found", end)));
        }

        let mut paths = Vec::new();
        let mut trail = vec![start.to_string()];
        let mut edge_trail = Vec::new();
        self.dfs_paths(start, end, depth, direction, &mut trail, &mut edge_trail, &mut paths)?;

        let mut shortest: Option<LineagePath> = None;
        for path in &paths {
            if shortest.as_ref().is_none_or(|s| path.hops() < s.hops()) {
                shortest = Some(path.clone());
            }
        }

        Ok(PathSearch { paths, shortest })
    }

    #[allow(clippy::too_many_arguments)]
    fn dfs_paths(
        &self,
        current: &str,
        end: &str,
        max_depth: usize,
        direction: Direction,
        trail: &mut Vec<String>,
        edge_trail: &mut Vec<Edge>,
        found: &mut Vec<LineagePath>,
    ) -> Result<()> {
        for (edge, next) in self.neighbors(current, direction)? {
            if trail.iter().any(|id| id == &next) {
                continue;
            }
            edge_trail.push(edge);
            trail.push(next.clone());

            if next == end {
                let confidence = edge_trail.iter().map(|e| e.confidence).product();
                found.push(LineagePath {
                    node_ids: trail.clone(),
                    edges: edge_trail.clone(),
                    confidence,
                });
            } else if edge_trail.len() < max_depth {
                self.dfs_paths(&next, end, max_depth, direction, trail, edge_trail, found)?;
            }

            trail.pop();
            edge_trail.pop();
        }
        Ok(())
    }

    /// Adjacent edges with the id of the node on the far side
    fn neighbors(&self, id: &str, direction: Direction) -> Result<Vec<(Edge, String)>> {
        let mut adjacent = Vec::new();
        if matches!(direction, Direction::Upstream | Direction::Both) {
            for edge in self.store.active_edges_from(id)? {
                let next = edge.to_id.clone();
                adjacent.push((edge, next));
            }
        }
        if matches!(direction, Direction::Downstream | Direction::Both) {
            for edge in self.store.active_edges_to(id)? {
                let next = edge.from_id.clone();
                adjacent.push((edge, next));
            }
        }
        Ok(adjacent)
    }

    /// Strictly downstream impact analysis from `node_id`: every asset
    /// that directly or transitively depends on it.
    ///
    /// Cycle safety is per-branch: a node already on the current descent
    /// path is not revisited, so diamond-shaped graphs are explored along
    /// every branch while write-time cycle rejection keeps termination
    /// guaranteed.
    pub fn analyze_impact(&self, node_id: &str, max_depth: usize) -> Result<ImpactReport> {
        let depth = max_depth.clamp(1, MAX_TRAVERSAL_DEPTH);

        if self.store.get_node(node_id)?.is_none() {
            return Err(Error::NotFound(format!("node {} not found", node_id)));
        }

        let mut min_depths: HashMap<String, usize> = HashMap::new();
        let mut radius = 0usize;
        let mut trail = vec![node_id.to_string()];
        self.impact_dfs(node_id, 0, depth, &mut trail, &mut min_depths, &mut radius)?;

        let mut affected = Vec::with_capacity(min_depths.len());
        for (id, depth) in &min_depths {
            if let Some(node) = self.store.get_node(id)? {
                affected.push(AffectedNode { node, depth: *depth });
            }
        }
        affected.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then_with(|| a.node.label.cmp(&b.node.label))
        });

        let critical_paths = affected
            .iter()
            .filter(|a| a.node.node_type.is_critical())
            .cloned()
            .collect();

        Ok(ImpactReport {
            affected,
            impact_radius: radius,
            critical_paths,
        })
    }

    fn impact_dfs(
        &self,
        current: &str,
        depth: usize,
        max_depth: usize,
        trail: &mut Vec<String>,
        min_depths: &mut HashMap<String, usize>,
        radius: &mut usize,
    ) -> Result<()> {
        if depth >= max_depth {
            return Ok(());
        }
        // dependents sit on the `from` side of edges pointing at `current`
        for edge in self.store.active_edges_to(current)? {
            let next = edge.from_id;
            if trail.iter().any(|id| id == &next) {
                continue;
            }
            let next_depth = depth + 1;
            let entry = min_depths.entry(next.clone()).or_insert(next_depth);
            if next_depth < *entry {
                *entry = next_depth;
            }
            *radius = (*radius).max(next_depth);

            trail.push(next.clone());
            self.impact_dfs(&next, next_depth, max_depth, trail, min_depths, radius)?;
            trail.pop();
        }
        Ok(())
    }
}
