//! Node types - data assets tracked by the lineage graph
//!
//! A node is any cataloged asset a lineage edge can point at: physical
//! objects (database, schema, table, column, view, procedure, function),
//! pipeline stages (source, bronze, silver, gold, sink) and transformation
//! steps.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Asset categories recognized by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// External system feeding the platform
    Source,
    /// Raw landing tier
    Bronze,
    /// Cleaned/conformed tier
    Silver,
    /// Curated, consumption-ready tier
    Gold,
    /// Transformation step between assets
    Transformation,
    /// Terminal consumer (export, dashboard feed)
    Sink,
    Database,
    Schema,
    Table,
    Column,
    View,
    Procedure,
    Function,
}

impl NodeType {
    /// Get the string representation of the node type
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Source => "source",
            NodeType::Bronze => "bronze",
            NodeType::Silver => "silver",
            NodeType::Gold => "gold",
            NodeType::Transformation => "transformation",
            NodeType::Sink => "sink",
            NodeType::Database => "database",
            NodeType::Schema => "schema",
            NodeType::Table => "table",
            NodeType::Column => "column",
            NodeType::View => "view",
            NodeType::Procedure => "procedure",
            NodeType::Function => "function",
        }
    }

    /// Get all node types
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::Source,
            NodeType::Bronze,
            NodeType::Silver,
            NodeType::Gold,
            NodeType::Transformation,
            NodeType::Sink,
            NodeType::Database,
            NodeType::Schema,
            NodeType::Table,
            NodeType::Column,
            NodeType::View,
            NodeType::Procedure,
            NodeType::Function,
        ]
    }

    /// Gold-tier assets are flagged as high criticality by impact analysis
    pub fn is_critical(&self) -> bool {
        matches!(self, NodeType::Gold)
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "source" | "src" => Ok(NodeType::Source),
            "bronze" | "raw" => Ok(NodeType::Bronze),
            "silver" => Ok(NodeType::Silver),
            "gold" => Ok(NodeType::Gold),
            "transformation" | "transform" | "xform" => Ok(NodeType::Transformation),
            "sink" => Ok(NodeType::Sink),
            "database" | "db" => Ok(NodeType::Database),
            "schema" => Ok(NodeType::Schema),
            "table" | "tbl" => Ok(NodeType::Table),
            "column" | "col" => Ok(NodeType::Column),
            "view" => Ok(NodeType::View),
            "procedure" | "proc" => Ok(NodeType::Procedure),
            "function" | "func" => Ok(NodeType::Function),
            _ => Err(Error::Validation(format!("Unknown node type: {}", s))),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status shared by nodes and edges.
///
/// Entities are never physically removed: deletes tombstone them and all
/// default queries filter to `Active`. There is no public undelete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Tombstoned,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Tombstoned => "tombstoned",
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Status::Active),
            "tombstoned" => Ok(Status::Tombstoned),
            _ => Err(Error::Validation(format!("Unknown status: {}", s))),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A data asset in the lineage graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Server-assigned identifier (UUID v4)
    pub id: String,
    /// Display name
    pub label: String,
    pub node_type: NodeType,
    /// Identifier of the external store the asset lives in
    pub data_source: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub description: Option<String>,
    /// Opaque key-value map, stored and returned verbatim
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the node is tombstoned
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

impl Node {
    /// Materialize a node from a creation spec, assigning id and audit
    /// timestamps
    pub fn from_spec(spec: NodeSpec) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: spec.label,
            node_type: spec.node_type,
            data_source: spec.data_source,
            schema_name: spec.schema_name,
            table_name: spec.table_name,
            description: spec.description,
            metadata: spec.metadata,
            status: Status::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            created_by: spec.created_by,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Fully-qualified name when the physical coordinates are known
    pub fn qualified_name(&self) -> Option<String> {
        match (&self.data_source, &self.schema_name, &self.table_name) {
            (Some(source), Some(schema), Some(table)) => {
                Some(format!("{}.{}.{}", source, schema, table))
            }
            _ => None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Caller-supplied fields for node creation.
///
/// Identity (id, timestamps, status) is assigned by the engine at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub label: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NodeSpec {
    pub fn new(label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            label: label.into(),
            node_type,
            data_source: None,
            schema_name: None,
            table_name: None,
            description: None,
            metadata: HashMap::new(),
            created_by: None,
        }
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }

    /// Set the physical coordinates within the data source
    pub fn with_location(
        mut self,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        self.schema_name = Some(schema_name.into());
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// True when all three identity coordinates are present, enabling
    /// duplicate detection against existing assets
    pub fn has_identity(&self) -> bool {
        self.data_source.is_some() && self.schema_name.is_some() && self.table_name.is_some()
    }
}

/// Mutable fields for a node update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<HashMap<String, Value>>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.description.is_none() && self.metadata.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_roundtrip() {
        for node_type in NodeType::all() {
            let s = node_type.as_str();
            let parsed: NodeType = s.parse().unwrap();
            assert_eq!(*node_type, parsed);
        }
    }

    #[test]
    fn test_node_type_aliases() {
        assert_eq!(NodeType::from_str("tbl").unwrap(), NodeType::Table);
        assert_eq!(NodeType::from_str("transform").unwrap(), NodeType::Transformation);
        assert_eq!(NodeType::from_str("db").unwrap(), NodeType::Database);
        assert!(NodeType::from_str("warehouse").is_err());
    }

    #[test]
    fn test_from_spec_assigns_identity() {
        let spec = NodeSpec::new("orders", NodeType::Table)
            .with_data_source("warehouse")
            .with_location("sales", "orders")
            .with_description("Raw order facts");

        let node = Node::from_spec(spec);
        assert!(!node.id.is_empty());
        assert_eq!(node.status, Status::Active);
        assert_eq!(node.created_at, node.updated_at);
        assert!(node.deleted_at.is_none());
        assert_eq!(node.qualified_name().unwrap(), "warehouse.sales.orders");
    }

    #[test]
    fn test_has_identity_requires_all_three() {
        let spec = NodeSpec::new("orders", NodeType::Table).with_data_source("warehouse");
        assert!(!spec.has_identity());

        let spec = spec.with_location("sales", "orders");
        assert!(spec.has_identity());
    }

    #[test]
    fn test_gold_is_critical() {
        assert!(NodeType::Gold.is_critical());
        assert!(!NodeType::Silver.is_critical());
        assert!(!NodeType::Table.is_critical());
    }
}
