//! Lineage engine - the public mutation and query surface
//!
//! Wires the store, validator, traversal engine and result cache together.
//! Mutations validate, commit atomically and purge the cache; queries go
//! through the cache and fall back to direct computation on any cache
//! trouble.

use crate::cache::{LruQueryCache, QueryCache, cache_key};
use crate::edge::{Edge, EdgePatch, EdgeSpec};
use crate::import::{self, BulkImportReport};
use crate::node::{Node, NodePatch, NodeSpec};
use crate::query::{Direction, ImpactReport, PathSearch, SubgraphFilter, SubgraphResult, TraversalEngine};
use crate::storage::{GraphStatistics, SqliteStore};
use crate::validator::MutationValidator;
use crate::{Error, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Thread-safe facade over the lineage graph.
///
/// Cloning is cheap and shares the underlying store and cache. The store
/// mutex serializes statement execution; the partial unique indexes remain
/// the cross-process backstop for racing writers.
#[derive(Clone)]
pub struct LineageEngine {
    store: Arc<Mutex<SqliteStore>>,
    cache: Arc<dyn QueryCache>,
}

impl LineageEngine {
    /// Build an engine over an existing store with an injected cache
    pub fn new(store: SqliteStore, cache: Arc<dyn QueryCache>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cache,
        }
    }

    /// Open a file-backed engine with the default cache
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(
            SqliteStore::open(path)?,
            Arc::new(LruQueryCache::with_defaults()),
        ))
    }

    /// In-memory engine with the default cache (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(
            SqliteStore::open_in_memory()?,
            Arc::new(LruQueryCache::with_defaults()),
        ))
    }

    /// The cache shared by this engine, for wiring a background sweeper
    pub fn cache(&self) -> Arc<dyn QueryCache> {
        Arc::clone(&self.cache)
    }

    // ========== Mutation surface ==========

    /// Create a node. Rejects a duplicate when an Active node already
    /// shares all three identity coordinates.
    pub fn create_node(&self, spec: NodeSpec) -> Result<Node> {
        let node = {
            let store = self.store.lock();
            MutationValidator::new(&store).validate_node(&spec)?;
            let node = Node::from_spec(spec);
            store.insert_node(&node).map_err(|err| {
                classify_unique_violation(err, format!("node {} already exists", node.label))
            })?;
            node
        };
        self.cache.invalidate_all();
        tracing::info!(id = %node.id, label = %node.label, "created node");
        Ok(node)
    }

    /// Create an edge after running the full invariant check sequence.
    /// The checks and the insert share one transaction.
    pub fn create_edge(&self, spec: EdgeSpec) -> Result<Edge> {
        let edge = {
            let store = self.store.lock();
            let tx = store.begin()?;
            MutationValidator::new(&store).validate_edge(&spec)?;
            let edge = Edge::from_spec(spec);
            store.insert_edge(&edge).map_err(|err| {
                classify_unique_violation(
                    err,
                    format!(
                        "edge {} -> {} ({}) already exists",
                        edge.from_id, edge.to_id, edge.relationship
                    ),
                )
            })?;
            tx.commit()?;
            edge
        };
        self.cache.invalidate_all();
        tracing::info!(
            id = %edge.id,
            from = %edge.from_id,
            to = %edge.to_id,
            relationship = %edge.relationship,
            "created edge"
        );
        Ok(edge)
    }

    /// Update the mutable fields of a node
    pub fn update_node(&self, id: &str, patch: NodePatch) -> Result<Node> {
        if patch.is_empty() {
            return Err(Error::Validation("no fields to update".into()));
        }
        if patch.label.as_deref().is_some_and(|label| label.trim().is_empty()) {
            return Err(Error::Validation("node label must not be empty".into()));
        }

        let node = {
            let store = self.store.lock();
            let mut node = store
                .get_node(id)?
                .ok_or_else(|| Error::NotFound(format!("node {} not found", id)))?;
            if let Some(label) = patch.label {
                node.label = label;
            }
            if let Some(description) = patch.description {
                node.description = Some(description);
            }
            if let Some(metadata) = patch.metadata {
                node.metadata = metadata;
            }
            node.updated_at = Utc::now();
            store.update_node(&node)?;
            node
        };
        self.cache.invalidate_all();
        tracing::info!(id = %node.id, "updated node");
        Ok(node)
    }

    /// Update the mutable fields of an edge
    pub fn update_edge(&self, id: &str, patch: EdgePatch) -> Result<Edge> {
        if patch.is_empty() {
            return Err(Error::Validation("no fields to update".into()));
        }
        if let Some(confidence) = patch.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::Validation(format!(
                    "confidence {} is outside [0.0, 1.0]",
                    confidence
                )));
            }
        }

        let edge = {
            let store = self.store.lock();
            let mut edge = store
                .get_edge(id)?
                .ok_or_else(|| Error::NotFound(format!("edge {} not found", id)))?;
            if let Some(transformation) = patch.transformation {
                edge.transformation = Some(transformation);
            }
            if let Some(confidence) = patch.confidence {
                edge.confidence = confidence;
            }
            if let Some(metadata) = patch.metadata {
                edge.metadata = metadata;
            }
            edge.updated_at = Utc::now();
            store.update_edge(&edge)?;
            edge
        };
        self.cache.invalidate_all();
        tracing::info!(id = %edge.id, "updated edge");
        Ok(edge)
    }

    /// Tombstone a node and every edge touching it, atomically
    pub fn delete_node(&self, id: &str) -> Result<()> {
        let edges = self.store.lock().tombstone_node(id)?;
        self.cache.invalidate_all();
        tracing::info!(id, edges_tombstoned = edges, "tombstoned node");
        Ok(())
    }

    /// Tombstone a single edge
    pub fn delete_edge(&self, id: &str) -> Result<()> {
        self.store.lock().tombstone_edge(id)?;
        self.cache.invalidate_all();
        tracing::info!(id, "tombstoned edge");
        Ok(())
    }

    /// Apply a bounded batch of node creations with per-item isolation
    pub fn bulk_create_nodes(&self, specs: Vec<NodeSpec>) -> Result<BulkImportReport> {
        let report = {
            let store = self.store.lock();
            import::bulk_create_nodes(&store, specs)?
        };
        self.cache.invalidate_all();
        tracing::info!(
            created = report.created.len(),
            rejected = report.errors.len(),
            "bulk import finished"
        );
        Ok(report)
    }

    // ========== Query surface ==========

    /// Point lookup of an Active node
    pub fn get_node(&self, id: &str) -> Result<Node> {
        self.store
            .lock()
            .get_node(id)?
            .ok_or_else(|| Error::NotFound(format!("node {} not found", id)))
    }

    /// Point lookup including tombstoned history
    pub fn get_node_any(&self, id: &str) -> Result<Node> {
        self.store
            .lock()
            .get_node_any(id)?
            .ok_or_else(|| Error::NotFound(format!("node {} not found", id)))
    }

    /// Point lookup of an Active edge
    pub fn get_edge(&self, id: &str) -> Result<Edge> {
        self.store
            .lock()
            .get_edge(id)?
            .ok_or_else(|| Error::NotFound(format!("edge {} not found", id)))
    }

    /// Point lookup including tombstoned history
    pub fn get_edge_any(&self, id: &str) -> Result<Edge> {
        self.store
            .lock()
            .get_edge_any(id)?
            .ok_or_else(|| Error::NotFound(format!("edge {} not found", id)))
    }

    /// Cached subgraph retrieval
    pub fn get_subgraph(&self, filter: &SubgraphFilter) -> Result<SubgraphResult> {
        self.cached("subgraph", filter, || {
            let store = self.store.lock();
            TraversalEngine::new(&store).get_subgraph(filter)
        })
    }

    /// Cached path enumeration between two nodes
    pub fn find_paths(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
        direction: Direction,
    ) -> Result<PathSearch> {
        #[derive(Serialize)]
        struct Params<'a> {
            start: &'a str,
            end: &'a str,
            max_depth: usize,
            direction: Direction,
        }
        let params = Params {
            start,
            end,
            max_depth,
            direction,
        };
        self.cached("paths", &params, || {
            let store = self.store.lock();
            TraversalEngine::new(&store).find_paths(start, end, max_depth, direction)
        })
    }

    /// Cached downstream impact analysis
    pub fn analyze_impact(&self, node_id: &str, max_depth: usize) -> Result<ImpactReport> {
        #[derive(Serialize)]
        struct Params<'a> {
            node_id: &'a str,
            max_depth: usize,
        }
        let params = Params { node_id, max_depth };
        self.cached("impact", &params, || {
            let store = self.store.lock();
            TraversalEngine::new(&store).analyze_impact(node_id, max_depth)
        })
    }

    /// Cached aggregate statistics, optionally scoped to one data source
    pub fn get_statistics(&self, scope: Option<&str>) -> Result<GraphStatistics> {
        #[derive(Serialize)]
        struct Params<'a> {
            scope: Option<&'a str>,
        }
        let params = Params { scope };
        self.cached("statistics", &params, || {
            self.store.lock().statistics(scope)
        })
    }

    /// Get-or-compute through the cache. Cache trouble is never fatal:
    /// an unusable key or entry just means computing directly.
    fn cached<T, F>(&self, operation: &str, params: &impl Serialize, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let key = match cache_key(operation, params) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(operation, error = %err, "cache key construction failed");
                return compute();
            }
        };

        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value(value) {
                Ok(result) => return Ok(result),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "dropping undecodable cache entry")
                }
            }
        }

        let result = compute()?;
        match serde_json::to_value(&result) {
            Ok(value) => self.cache.put(&key, value),
            Err(err) => tracing::warn!(key = %key, error = %err, "failed to cache query result"),
        }
        Ok(result)
    }
}

/// Map a uniqueness-constraint violation raised by the store onto
/// Duplicate; anything else stays a backing-store failure.
fn classify_unique_violation(err: Error, what: String) -> Error {
    if let Error::Storage(rusqlite::Error::SqliteFailure(e, _)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            return Error::Duplicate(what);
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::RelationshipType;
    use crate::node::NodeType;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cache double recording computation-visible traffic: each `put` is
    /// one underlying computation.
    #[derive(Default)]
    struct CountingCache {
        entries: Mutex<HashMap<String, Value>>,
        puts: AtomicUsize,
        hits: AtomicUsize,
    }

    impl QueryCache for CountingCache {
        fn get(&self, key: &str) -> Option<Value> {
            let value = self.entries.lock().get(key).cloned();
            if value.is_some() {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            value
        }

        fn put(&self, key: &str, value: Value) {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().insert(key.to_string(), value);
        }

        fn invalidate_all(&self) {
            self.entries.lock().clear();
        }

        fn purge_expired(&self) {}

        fn len(&self) -> usize {
            self.entries.lock().len()
        }
    }

    fn engine() -> LineageEngine {
        LineageEngine::in_memory().unwrap()
    }

    fn counting_engine() -> (LineageEngine, Arc<CountingCache>) {
        let cache = Arc::new(CountingCache::default());
        let engine = LineageEngine::new(
            SqliteStore::open_in_memory().unwrap(),
            Arc::clone(&cache) as Arc<dyn QueryCache>,
        );
        (engine, cache)
    }

    fn table(engine: &LineageEngine, label: &str) -> Node {
        engine
            .create_node(NodeSpec::new(label, NodeType::Table))
            .unwrap()
    }

    #[test]
    fn test_create_node_roundtrip() {
        let engine = engine();
        let created = engine
            .create_node(
                NodeSpec::new("orders", NodeType::Table)
                    .with_data_source("warehouse")
                    .with_location("sales", "orders")
                    .with_description("Raw order facts")
                    .with_created_by("crawler"),
            )
            .unwrap();

        let fetched = engine.get_node(&created.id).unwrap();
        assert_eq!(fetched.label, "orders");
        assert_eq!(fetched.data_source.as_deref(), Some("warehouse"));
        assert_eq!(fetched.description.as_deref(), Some("Raw order facts"));
        assert_eq!(fetched.created_by.as_deref(), Some("crawler"));
    }

    #[test]
    fn test_distinct_identities_all_visible_in_subgraph() {
        let engine = engine();
        let mut ids = Vec::new();
        for table_name in ["orders", "customers", "payments"] {
            let node = engine
                .create_node(
                    NodeSpec::new(table_name, NodeType::Table)
                        .with_data_source("warehouse")
                        .with_location("sales", table_name),
                )
                .unwrap();
            ids.push(node.id);
        }

        let subgraph = engine.get_subgraph(&SubgraphFilter::default()).unwrap();
        assert_eq!(subgraph.nodes.len(), 3);
        for id in &ids {
            assert!(subgraph.nodes.iter().any(|n| &n.id == id));
        }
    }

    #[test]
    fn test_duplicate_node_identity_rejected() {
        let engine = engine();
        let spec = NodeSpec::new("orders", NodeType::Table)
            .with_data_source("warehouse")
            .with_location("sales", "orders");
        engine.create_node(spec.clone()).unwrap();

        assert!(matches!(
            engine.create_node(spec),
            Err(Error::Duplicate(_))
        ));
    }

    #[test]
    fn test_duplicate_edge_leaves_state_unchanged() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");

        let spec = EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom);
        engine.create_edge(spec.clone()).unwrap();

        assert!(matches!(
            engine.create_edge(spec),
            Err(Error::Duplicate(_))
        ));
        let subgraph = engine.get_subgraph(&SubgraphFilter::default()).unwrap();
        assert_eq!(subgraph.edges.len(), 1);
    }

    #[test]
    fn test_self_reference_rejected() {
        let engine = engine();
        let orders = table(&engine, "orders");

        assert!(matches!(
            engine.create_edge(EdgeSpec::new(
                &orders.id,
                &orders.id,
                RelationshipType::DerivesFrom
            )),
            Err(Error::SelfReference(_))
        ));
    }

    #[test]
    fn test_back_edge_rejected_and_not_persisted() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");

        engine
            .create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom))
            .unwrap();
        assert!(matches!(
            engine.create_edge(EdgeSpec::new(&b.id, &a.id, RelationshipType::DerivesFrom)),
            Err(Error::Cycle(_))
        ));

        let subgraph = engine.get_subgraph(&SubgraphFilter::default()).unwrap();
        assert_eq!(subgraph.edges.len(), 1);
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        let c = table(&engine, "c");

        engine
            .create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom))
            .unwrap();
        engine
            .create_edge(EdgeSpec::new(&b.id, &c.id, RelationshipType::DerivesFrom))
            .unwrap();

        assert!(matches!(
            engine.create_edge(EdgeSpec::new(&c.id, &a.id, RelationshipType::DerivesFrom)),
            Err(Error::Cycle(_))
        ));
    }

    #[test]
    fn test_edge_requires_active_endpoints() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        engine.delete_node(&b.id).unwrap();

        assert!(matches!(
            engine.create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_node_cascades_and_is_terminal() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        engine
            .create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom))
            .unwrap();

        engine.delete_node(&a.id).unwrap();

        assert!(matches!(engine.get_node(&a.id), Err(Error::NotFound(_))));
        // history lookup still sees the tombstone
        assert_eq!(
            engine.get_node_any(&a.id).unwrap().status,
            crate::node::Status::Tombstoned
        );
        let subgraph = engine.get_subgraph(&SubgraphFilter::default()).unwrap();
        assert_eq!(subgraph.nodes.len(), 1);
        assert!(subgraph.edges.is_empty());

        // double delete is an error, not a silent success
        assert!(matches!(
            engine.delete_node(&a.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_edge_twice_not_found() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        let edge = engine
            .create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom))
            .unwrap();

        engine.delete_edge(&edge.id).unwrap();
        assert!(matches!(
            engine.delete_edge(&edge.id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            engine.delete_edge("missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_node_bumps_updated_at() {
        let engine = engine();
        let node = table(&engine, "orders");

        let patch = NodePatch {
            label: Some("orders_v2".into()),
            description: Some("renamed".into()),
            ..Default::default()
        };
        let updated = engine.update_node(&node.id, patch).unwrap();

        assert_eq!(updated.id, node.id);
        assert_eq!(updated.label, "orders_v2");
        assert!(updated.updated_at > node.updated_at);
        assert_eq!(engine.get_node(&node.id).unwrap().label, "orders_v2");
    }

    #[test]
    fn test_update_edge_confidence_validated() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        let edge = engine
            .create_edge(EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom))
            .unwrap();

        assert!(matches!(
            engine.update_edge(
                &edge.id,
                EdgePatch {
                    confidence: Some(2.0),
                    ..Default::default()
                }
            ),
            Err(Error::Validation(_))
        ));

        let updated = engine
            .update_edge(
                &edge.id,
                EdgePatch {
                    confidence: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!((updated.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bulk_created_items_match_inputs() {
        let engine = engine();
        let specs = vec![
            NodeSpec::new("orders", NodeType::Table)
                .with_data_source("warehouse")
                .with_location("sales", "orders"),
            NodeSpec::new("", NodeType::Table),
            NodeSpec::new("daily_rollup", NodeType::Transformation)
                .with_description("nightly batch"),
        ];

        let report = engine.bulk_create_nodes(specs).unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 1);

        let first = &report.created[0];
        assert_eq!(first.label, "orders");
        assert_eq!(first.data_source.as_deref(), Some("warehouse"));
        assert_eq!(first.schema_name.as_deref(), Some("sales"));
        assert_eq!(first.table_name.as_deref(), Some("orders"));

        let second = &report.created[1];
        assert_eq!(second.label, "daily_rollup");
        assert_eq!(second.node_type, NodeType::Transformation);
        assert_eq!(second.description.as_deref(), Some("nightly batch"));

        // everything the report claims created is fetchable
        for node in &report.created {
            assert_eq!(engine.get_node(&node.id).unwrap().id, node.id);
        }
    }

    #[test]
    fn test_two_hop_path_confidence() {
        let engine = engine();
        let a = table(&engine, "a");
        let b = table(&engine, "b");
        let c = table(&engine, "c");
        engine
            .create_edge(
                EdgeSpec::new(&a.id, &b.id, RelationshipType::DerivesFrom).with_confidence(0.9),
            )
            .unwrap();
        engine
            .create_edge(
                EdgeSpec::new(&b.id, &c.id, RelationshipType::DerivesFrom).with_confidence(0.8),
            )
            .unwrap();

        let search = engine
            .find_paths(&a.id, &c.id, 5, Direction::Upstream)
            .unwrap();
        assert_eq!(search.paths.len(), 1);
        assert!((search.paths[0].confidence - 0.72).abs() < 1e-6);
    }

    #[test]
    fn test_impact_of_leaf_is_empty() {
        let engine = engine();
        let node = table(&engine, "leaf");

        let report = engine.analyze_impact(&node.id, 5).unwrap();
        assert!(report.affected.is_empty());
        assert_eq!(report.impact_radius, 0);
    }

    #[test]
    fn test_order_summary_scenario() {
        let engine = engine();
        let orders = engine
            .create_node(NodeSpec::new("orders", NodeType::Table))
            .unwrap();
        let summary = engine
            .create_node(NodeSpec::new("order_summary", NodeType::View))
            .unwrap();
        engine
            .create_edge(
                EdgeSpec::new(&summary.id, &orders.id, RelationshipType::DerivesFrom)
                    .with_confidence(1.0),
            )
            .unwrap();

        let search = engine
            .find_paths(&summary.id, &orders.id, 3, Direction::Both)
            .unwrap();
        assert_eq!(search.paths.len(), 1);
        let shortest = search.shortest.unwrap();
        assert_eq!(shortest.hops(), 1);
        assert!((shortest.confidence - 1.0).abs() < 1e-6);

        let report = engine.analyze_impact(&orders.id, 5).unwrap();
        assert_eq!(report.affected.len(), 1);
        assert_eq!(report.affected[0].node.id, summary.id);
        assert_eq!(report.affected[0].depth, 1);
    }

    #[test]
    fn test_statistics_scoped_and_cached_type() {
        let engine = engine();
        engine
            .create_node(NodeSpec::new("a", NodeType::Table).with_data_source("warehouse"))
            .unwrap();
        engine
            .create_node(NodeSpec::new("b", NodeType::Table).with_data_source("lake"))
            .unwrap();

        let all = engine.get_statistics(None).unwrap();
        assert_eq!(all.total_nodes, 2);

        let scoped = engine.get_statistics(Some("warehouse")).unwrap();
        assert_eq!(scoped.total_nodes, 1);
    }

    #[test]
    fn test_identical_queries_compute_once_within_ttl() {
        let (engine, cache) = counting_engine();
        table(&engine, "a");
        cache.puts.store(0, Ordering::SeqCst);

        let filter = SubgraphFilter::default();
        engine.get_subgraph(&filter).unwrap();
        engine.get_subgraph(&filter).unwrap();

        assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mutation_forces_recomputation() {
        let (engine, cache) = counting_engine();
        table(&engine, "a");
        cache.puts.store(0, Ordering::SeqCst);

        let filter = SubgraphFilter::default();
        assert_eq!(engine.get_subgraph(&filter).unwrap().nodes.len(), 1);

        table(&engine, "b");

        // the purge forced a second computation with fresh results
        assert_eq!(engine.get_subgraph(&filter).unwrap().nodes.len(), 2);
        assert_eq!(cache.puts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_different_params_are_different_entries() {
        let (engine, cache) = counting_engine();
        table(&engine, "a");
        cache.puts.store(0, Ordering::SeqCst);

        engine.get_subgraph(&SubgraphFilter::default()).unwrap();
        engine
            .get_subgraph(&SubgraphFilter {
                node_types: Some(vec![NodeType::View]),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(cache.puts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_query_errors_are_not_cached() {
        let (engine, cache) = counting_engine();
        cache.puts.store(0, Ordering::SeqCst);

        assert!(engine.analyze_impact("ghost", 3).is_err());
        assert_eq!(cache.puts.load(Ordering::SeqCst), 0);
    }
}
