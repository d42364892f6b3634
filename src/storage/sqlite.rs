//! SQLite storage implementation

use super::schema;
use crate::edge::{Edge, RelationshipType};
use crate::node::{Node, NodeType, Status};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

const NODE_COLUMNS: &str = "id, label, node_type, data_source, schema_name, table_name, \
     description, metadata, status, created_at, updated_at, deleted_at, created_by";

const EDGE_COLUMNS: &str = "id, from_id, to_id, relationship, transformation, confidence, \
     metadata, status, created_at, updated_at, deleted_at, created_by";

/// SQLite-backed storage for the lineage graph.
///
/// Holds the durable node/edge tables and serves point lookups, duplicate
/// probes and adjacency queries. Soft deletes only: every default query
/// filters to `status = 'active'`, history access goes through the `_any`
/// variants.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Begin an explicit transaction. Statements issued through this store
    /// run inside it until commit; dropping the handle rolls back.
    pub fn begin(&self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ========== Node Operations ==========

    /// Persist a fully-formed node. Uniqueness violations surface as
    /// `rusqlite::Error` for the caller to classify.
    pub fn insert_node(&self, node: &Node) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO nodes ({NODE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"),
            params![
                node.id,
                node.label,
                node.node_type.as_str(),
                node.data_source,
                node.schema_name,
                node.table_name,
                node.description,
                serde_json::to_string(&node.metadata)?,
                node.status.as_str(),
                node.created_at.to_rfc3339(),
                node.updated_at.to_rfc3339(),
                node.deleted_at.map(|t| t.to_rfc3339()),
                node.created_by,
            ],
        )?;
        Ok(())
    }

    /// Get an Active node by id
    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        self.conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 AND status = 'active'"),
                [id],
                |row| self.row_to_node(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a node by id regardless of lifecycle status (history opt-in)
    pub fn get_node_any(&self, id: &str) -> Result<Option<Node>> {
        self.conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
                [id],
                |row| self.row_to_node(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Duplicate probe: the Active node sharing all three identity
    /// coordinates, if one exists
    pub fn find_node_by_identity(
        &self,
        data_source: &str,
        schema_name: &str,
        table_name: &str,
    ) -> Result<Option<Node>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes \
                     WHERE data_source = ?1 AND schema_name = ?2 AND table_name = ?3 \
                       AND status = 'active'"
                ),
                params![data_source, schema_name, table_name],
                |row| self.row_to_node(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Write back the mutable fields of a node
    pub fn update_node(&self, node: &Node) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE nodes SET label = ?1, description = ?2, metadata = ?3, updated_at = ?4 \
             WHERE id = ?5 AND status = 'active'",
            params![
                node.label,
                node.description,
                serde_json::to_string(&node.metadata)?,
                node.updated_at.to_rfc3339(),
                node.id,
            ],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(format!("node {} not found", node.id)));
        }
        Ok(())
    }

    /// Tombstone a node and every Active edge touching it, atomically.
    /// Returns the number of edges tombstoned alongside the node.
    pub fn tombstone_node(&self, id: &str) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        let nodes = tx.execute(
            "UPDATE nodes SET status = 'tombstoned', deleted_at = ?1, updated_at = ?1 \
             WHERE id = ?2 AND status = 'active'",
            params![now, id],
        )?;
        if nodes == 0 {
            return Err(Error::NotFound(format!("node {} not found", id)));
        }
        let edges = tx.execute(
            "UPDATE edges SET status = 'tombstoned', deleted_at = ?1, updated_at = ?1 \
             WHERE (from_id = ?2 OR to_id = ?2) AND status = 'active'",
            params![now, id],
        )?;
        tx.commit()?;
        Ok(edges)
    }

    /// Helper to convert a row to a Node
    fn row_to_node(&self, row: &rusqlite::Row) -> rusqlite::Result<Node> {
        let type_str: String = row.get(2)?;
        let node_type = NodeType::from_str(&type_str).map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
        })?;
        let metadata_str: String = row.get(7)?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_str(&metadata_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
        let status_str: String = row.get(8)?;
        let status = Status::from_str(&status_str).map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e))
        })?;

        Ok(Node {
            id: row.get(0)?,
            label: row.get(1)?,
            node_type,
            data_source: row.get(3)?,
            schema_name: row.get(4)?,
            table_name: row.get(5)?,
            description: row.get(6)?,
            metadata,
            status,
            created_at: parse_timestamp(9, row.get(9)?)?,
            updated_at: parse_timestamp(10, row.get(10)?)?,
            deleted_at: row
                .get::<_, Option<String>>(11)?
                .map(|t| parse_timestamp(11, t))
                .transpose()?,
            created_by: row.get(12)?,
        })
    }

    // ========== Edge Operations ==========

    /// Persist a fully-formed edge. A triple-uniqueness violation surfaces
    /// as `rusqlite::Error` for the caller to classify.
    pub fn insert_edge(&self, edge: &Edge) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO edges ({EDGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
            params![
                edge.id,
                edge.from_id,
                edge.to_id,
                edge.relationship.as_str(),
                edge.transformation,
                edge.confidence,
                serde_json::to_string(&edge.metadata)?,
                edge.status.as_str(),
                edge.created_at.to_rfc3339(),
                edge.updated_at.to_rfc3339(),
                edge.deleted_at.map(|t| t.to_rfc3339()),
                edge.created_by,
            ],
        )?;
        Ok(())
    }

    /// Get an Active edge by id
    pub fn get_edge(&self, id: &str) -> Result<Option<Edge>> {
        self.conn
            .query_row(
                &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE id = ?1 AND status = 'active'"),
                [id],
                |row| self.row_to_edge(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get an edge by id regardless of lifecycle status (history opt-in)
    pub fn get_edge_any(&self, id: &str) -> Result<Option<Edge>> {
        self.conn
            .query_row(
                &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE id = ?1"),
                [id],
                |row| self.row_to_edge(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Duplicate probe: the Active edge with this exact triple, if any
    pub fn find_edge_triple(
        &self,
        from_id: &str,
        to_id: &str,
        relationship: RelationshipType,
    ) -> Result<Option<Edge>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM edges \
                     WHERE from_id = ?1 AND to_id = ?2 AND relationship = ?3 \
                       AND status = 'active'"
                ),
                params![from_id, to_id, relationship.as_str()],
                |row| self.row_to_edge(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Write back the mutable fields of an edge
    pub fn update_edge(&self, edge: &Edge) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE edges SET transformation = ?1, confidence = ?2, metadata = ?3, updated_at = ?4 \
             WHERE id = ?5 AND status = 'active'",
            params![
                edge.transformation,
                edge.confidence,
                serde_json::to_string(&edge.metadata)?,
                edge.updated_at.to_rfc3339(),
                edge.id,
            ],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(format!("edge {} not found", edge.id)));
        }
        Ok(())
    }

    /// Tombstone a single edge
    pub fn tombstone_edge(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn.execute(
            "UPDATE edges SET status = 'tombstoned', deleted_at = ?1, updated_at = ?1 \
             WHERE id = ?2 AND status = 'active'",
            params![now, id],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(format!("edge {} not found", id)));
        }
        Ok(())
    }

    /// Active edges leaving a node (downstream adjacency)
    pub fn active_edges_from(&self, id: &str) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges \
             WHERE from_id = ?1 AND status = 'active' ORDER BY to_id"
        ))?;
        let edges = stmt
            .query_map([id], |row| self.row_to_edge(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Active edges entering a node (upstream adjacency)
    pub fn active_edges_to(&self, id: &str) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges \
             WHERE to_id = ?1 AND status = 'active' ORDER BY from_id"
        ))?;
        let edges = stmt
            .query_map([id], |row| self.row_to_edge(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Helper to convert a row to an Edge
    fn row_to_edge(&self, row: &rusqlite::Row) -> rusqlite::Result<Edge> {
        let rel_str: String = row.get(3)?;
        let relationship = RelationshipType::from_str(&rel_str).map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
        })?;
        let metadata_str: String = row.get(6)?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_str(&metadata_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
        let status_str: String = row.get(7)?;
        let status = Status::from_str(&status_str).map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
        })?;

        Ok(Edge {
            id: row.get(0)?,
            from_id: row.get(1)?,
            to_id: row.get(2)?,
            relationship,
            transformation: row.get(4)?,
            confidence: row.get(5)?,
            metadata,
            status,
            created_at: parse_timestamp(8, row.get(8)?)?,
            updated_at: parse_timestamp(9, row.get(9)?)?,
            deleted_at: row
                .get::<_, Option<String>>(10)?
                .map(|t| parse_timestamp(10, t))
                .transpose()?,
            created_by: row.get(11)?,
        })
    }

    // ========== Listing (subgraph retrieval) ==========

    /// List Active nodes matching the filters, ordered by (type, label).
    /// Type names come from the enum, never from user input.
    pub fn list_nodes(
        &self,
        data_source: Option<&str>,
        node_types: Option<&[NodeType]>,
        limit: usize,
    ) -> Result<Vec<Node>> {
        let mut sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE status = 'active'");
        let mut bound: Vec<&dyn ToSql> = Vec::new();

        if let Some(source) = &data_source {
            sql.push_str(" AND data_source = ?");
            bound.push(source);
        }
        if let Some(types) = node_types {
            if !types.is_empty() {
                let list = types
                    .iter()
                    .map(|t| format!("'{}'", t.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!(" AND node_type IN ({list})"));
            }
        }
        sql.push_str(" ORDER BY node_type, label LIMIT ?");
        let limit = limit as i64;
        bound.push(&limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let nodes = stmt
            .query_map(bound.as_slice(), |row| self.row_to_node(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    /// List Active edges matching the filters, ordered by (from, to).
    /// A data-source scope keeps edges with at least one endpoint in the
    /// scoped source.
    pub fn list_edges(
        &self,
        data_source: Option<&str>,
        relationships: Option<&[RelationshipType]>,
        limit: usize,
    ) -> Result<Vec<Edge>> {
        let mut sql = format!("SELECT {EDGE_COLUMNS} FROM edges e WHERE e.status = 'active'");
        let mut bound: Vec<&dyn ToSql> = Vec::new();

        if let Some(source) = &data_source {
            sql.push_str(
                " AND (EXISTS (SELECT 1 FROM nodes n WHERE n.id = e.from_id \
                     AND n.status = 'active' AND n.data_source = ?1) \
                  OR EXISTS (SELECT 1 FROM nodes n WHERE n.id = e.to_id \
                     AND n.status = 'active' AND n.data_source = ?1))",
            );
            bound.push(source);
        }
        if let Some(rels) = relationships {
            if !rels.is_empty() {
                let list = rels
                    .iter()
                    .map(|r| format!("'{}'", r.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!(" AND e.relationship IN ({list})"));
            }
        }
        sql.push_str(" ORDER BY e.from_id, e.to_id LIMIT ?");
        let limit = limit as i64;
        bound.push(&limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let edges = stmt
            .query_map(bound.as_slice(), |row| self.row_to_edge(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    // ========== Statistics ==========

    /// Aggregate graph statistics, optionally scoped to one data source
    pub fn statistics(&self, scope: Option<&str>) -> Result<GraphStatistics> {
        let node_scope = scope.map(|_| " AND data_source = ?1").unwrap_or("");
        let edge_scope = scope
            .map(|_| {
                " AND (EXISTS (SELECT 1 FROM nodes n WHERE n.id = e.from_id \
                     AND n.status = 'active' AND n.data_source = ?1) \
                  OR EXISTS (SELECT 1 FROM nodes n WHERE n.id = e.to_id \
                     AND n.status = 'active' AND n.data_source = ?1))"
            })
            .unwrap_or("");
        let bound: Vec<&dyn ToSql> = match &scope {
            Some(source) => vec![source],
            None => vec![],
        };

        let total_nodes: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM nodes WHERE status = 'active'{node_scope}"),
            bound.as_slice(),
            |row| row.get(0),
        )?;
        let total_edges: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM edges e WHERE e.status = 'active'{edge_scope}"),
            bound.as_slice(),
            |row| row.get(0),
        )?;

        let mut nodes_by_type = HashMap::new();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT node_type, COUNT(*) FROM nodes WHERE status = 'active'{node_scope} \
             GROUP BY node_type"
        ))?;
        let rows = stmt.query_map(bound.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (node_type, count) = row?;
            nodes_by_type.insert(node_type, count as usize);
        }

        let mut edges_by_relationship = HashMap::new();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT relationship, COUNT(*) FROM edges e WHERE e.status = 'active'{edge_scope} \
             GROUP BY relationship"
        ))?;
        let rows = stmt.query_map(bound.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (relationship, count) = row?;
            edges_by_relationship.insert(relationship, count as usize);
        }

        let orphan_nodes: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM nodes WHERE status = 'active'{node_scope} \
                 AND NOT EXISTS (SELECT 1 FROM edges e WHERE e.status = 'active' \
                     AND (e.from_id = nodes.id OR e.to_id = nodes.id))"
            ),
            bound.as_slice(),
            |row| row.get(0),
        )?;

        let mean_confidence: f64 = self
            .conn
            .query_row(
                &format!("SELECT AVG(confidence) FROM edges e WHERE e.status = 'active'{edge_scope}"),
                bound.as_slice(),
                |row| row.get::<_, Option<f64>>(0),
            )?
            .unwrap_or(0.0);

        Ok(GraphStatistics::new(
            total_nodes as usize,
            total_edges as usize,
            nodes_by_type,
            edges_by_relationship,
            orphan_nodes as usize,
            mean_confidence as f32,
        ))
    }

    /// Count all Active nodes
    pub fn count_nodes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Count all Active edges
    pub fn count_edges(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Aggregate graph statistics.
///
/// The health score blends relationship certainty and connectivity:
/// 0.6 x mean edge confidence + 0.4 x (1 - orphans/total), as an integer
/// percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: HashMap<String, usize>,
    pub edges_by_relationship: HashMap<String, usize>,
    /// Active nodes with no Active edge in either direction
    pub orphan_nodes: usize,
    pub mean_confidence: f32,
    /// Composite health percentage in [0, 100]
    pub health_score: u8,
}

impl GraphStatistics {
    pub fn new(
        total_nodes: usize,
        total_edges: usize,
        nodes_by_type: HashMap<String, usize>,
        edges_by_relationship: HashMap<String, usize>,
        orphan_nodes: usize,
        mean_confidence: f32,
    ) -> Self {
        let health_score = if total_nodes == 0 {
            0
        } else {
            let connectivity = 1.0 - orphan_nodes as f32 / total_nodes as f32;
            ((0.6 * mean_confidence + 0.4 * connectivity) * 100.0).round() as u8
        };
        Self {
            total_nodes,
            total_edges,
            nodes_by_type,
            edges_by_relationship,
            orphan_nodes,
            mean_confidence,
            health_score,
        }
    }
}

impl std::fmt::Display for GraphStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lineage Graph Statistics:")?;
        writeln!(f, "  Nodes: {}", self.total_nodes)?;
        writeln!(f, "  Edges: {}", self.total_edges)?;
        writeln!(f, "  Orphans: {}", self.orphan_nodes)?;
        writeln!(f, "  Mean confidence: {:.2}", self.mean_confidence)?;
        writeln!(f, "  Health score: {}%", self.health_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeSpec;
    use crate::node::NodeSpec;

    fn table_node(label: &str) -> Node {
        Node::from_spec(NodeSpec::new(label, NodeType::Table))
    }

    fn edge_between(from: &Node, to: &Node, confidence: f32) -> Edge {
        Edge::from_spec(
            EdgeSpec::new(&from.id, &to.id, RelationshipType::DerivesFrom)
                .with_confidence(confidence),
        )
    }

    #[test]
    fn test_node_crud() {
        let store = SqliteStore::open_in_memory().unwrap();

        let node = Node::from_spec(
            NodeSpec::new("orders", NodeType::Table)
                .with_data_source("warehouse")
                .with_location("sales", "orders")
                .with_metadata("row_count", serde_json::json!(42)),
        );
        store.insert_node(&node).unwrap();

        let retrieved = store.get_node(&node.id).unwrap().unwrap();
        assert_eq!(retrieved.label, "orders");
        assert_eq!(retrieved.node_type, NodeType::Table);
        assert_eq!(retrieved.metadata["row_count"], serde_json::json!(42));
        assert_eq!(retrieved.created_at, node.created_at);
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.db");

        let node = table_node("orders");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_node(&node).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get_node(&node.id).unwrap().is_some());
    }

    #[test]
    fn test_identity_probe() {
        let store = SqliteStore::open_in_memory().unwrap();

        let node = Node::from_spec(
            NodeSpec::new("orders", NodeType::Table)
                .with_data_source("warehouse")
                .with_location("sales", "orders"),
        );
        store.insert_node(&node).unwrap();

        let found = store
            .find_node_by_identity("warehouse", "sales", "orders")
            .unwrap();
        assert!(found.is_some());
        assert!(store
            .find_node_by_identity("warehouse", "sales", "returns")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_identity_unique_index_backstop() {
        let store = SqliteStore::open_in_memory().unwrap();

        let spec = NodeSpec::new("orders", NodeType::Table)
            .with_data_source("warehouse")
            .with_location("sales", "orders");
        store.insert_node(&Node::from_spec(spec.clone())).unwrap();

        let err = store.insert_node(&Node::from_spec(spec)).unwrap_err();
        match err {
            Error::Storage(rusqlite::Error::SqliteFailure(e, _)) => {
                assert_eq!(e.code, rusqlite::ErrorCode::ConstraintViolation);
            }
            other => panic!("expected constraint violation, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_triple_unique_index_backstop() {
        let store = SqliteStore::open_in_memory().unwrap();

        let a = table_node("a");
        let b = table_node("b");
        store.insert_node(&a).unwrap();
        store.insert_node(&b).unwrap();

        store.insert_edge(&edge_between(&a, &b, 0.9)).unwrap();
        let err = store.insert_edge(&edge_between(&a, &b, 0.5)).unwrap_err();
        match err {
            Error::Storage(rusqlite::Error::SqliteFailure(e, _)) => {
                assert_eq!(e.code, rusqlite::ErrorCode::ConstraintViolation);
            }
            other => panic!("expected constraint violation, got {other:?}"),
        }
    }

    #[test]
    fn test_tombstone_node_cascades_to_edges() {
        let store = SqliteStore::open_in_memory().unwrap();

        let a = table_node("a");
        let b = table_node("b");
        let c = table_node("c");
        for node in [&a, &b, &c] {
            store.insert_node(node).unwrap();
        }
        store.insert_edge(&edge_between(&a, &b, 1.0)).unwrap();
        store.insert_edge(&edge_between(&c, &a, 1.0)).unwrap();
        store.insert_edge(&edge_between(&b, &c, 1.0)).unwrap();

        let tombstoned = store.tombstone_node(&a.id).unwrap();
        assert_eq!(tombstoned, 2);

        assert!(store.get_node(&a.id).unwrap().is_none());
        let history = store.get_node_any(&a.id).unwrap().unwrap();
        assert_eq!(history.status, Status::Tombstoned);
        assert!(history.deleted_at.is_some());

        assert!(store.active_edges_from(&a.id).unwrap().is_empty());
        assert!(store.active_edges_to(&a.id).unwrap().is_empty());
        // untouched edge survives
        assert_eq!(store.active_edges_from(&b.id).unwrap().len(), 1);
    }

    #[test]
    fn test_tombstone_twice_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();

        let node = table_node("a");
        store.insert_node(&node).unwrap();
        store.tombstone_node(&node.id).unwrap();

        assert!(matches!(
            store.tombstone_node(&node.id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.tombstone_edge("missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_tombstoned_triple_does_not_block_recreation() {
        let store = SqliteStore::open_in_memory().unwrap();

        let a = table_node("a");
        let b = table_node("b");
        store.insert_node(&a).unwrap();
        store.insert_node(&b).unwrap();

        let edge = edge_between(&a, &b, 1.0);
        store.insert_edge(&edge).unwrap();
        store.tombstone_edge(&edge.id).unwrap();

        store.insert_edge(&edge_between(&a, &b, 0.7)).unwrap();
        assert!(store
            .find_edge_triple(&a.id, &b.id, RelationshipType::DerivesFrom)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_list_nodes_ordering_and_filters() {
        let store = SqliteStore::open_in_memory().unwrap();

        let view = Node::from_spec(
            NodeSpec::new("summary", NodeType::View).with_data_source("warehouse"),
        );
        let table_b = Node::from_spec(
            NodeSpec::new("b_orders", NodeType::Table).with_data_source("warehouse"),
        );
        let table_a = Node::from_spec(
            NodeSpec::new("a_orders", NodeType::Table).with_data_source("lake"),
        );
        for node in [&view, &table_b, &table_a] {
            store.insert_node(node).unwrap();
        }

        let all = store.list_nodes(None, None, 100).unwrap();
        let labels: Vec<_> = all.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["a_orders", "b_orders", "summary"]);

        let scoped = store.list_nodes(Some("warehouse"), None, 100).unwrap();
        assert_eq!(scoped.len(), 2);

        let tables = store
            .list_nodes(None, Some(&[NodeType::Table]), 100)
            .unwrap();
        assert_eq!(tables.len(), 2);

        let capped = store.list_nodes(None, None, 1).unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_statistics_arithmetic() {
        let store = SqliteStore::open_in_memory().unwrap();

        let a = table_node("a");
        let b = table_node("b");
        let orphan = table_node("orphan");
        for node in [&a, &b, &orphan] {
            store.insert_node(node).unwrap();
        }
        store.insert_edge(&edge_between(&a, &b, 0.9)).unwrap();

        let stats = store.statistics(None).unwrap();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.orphan_nodes, 1);
        assert_eq!(stats.nodes_by_type["table"], 3);
        assert_eq!(stats.edges_by_relationship["derives_from"], 1);
        assert!((stats.mean_confidence - 0.9).abs() < 1e-6);
        // 0.6 * 0.9 + 0.4 * (1 - 1/3) = 0.8066... -> 81%
        assert_eq!(stats.health_score, 81);
    }

    #[test]
    fn test_statistics_empty_graph() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = store.statistics(None).unwrap();
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.health_score, 0);
    }
}
