//! Edge types - directed lineage relationships between data assets
//!
//! Every discovered dependency reduces to four relationship types:
//! - `DerivesFrom`: asset computed from another (view over a table)
//! - `TransformsTo`: pipeline step feeding a downstream asset
//! - `CopiesFrom`: replication without reshaping
//! - `AggregatesFrom`: rollup/summary over a source

use crate::node::Status;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Confidence applied to edges whose producer did not score them
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Directed relationship kinds between lineage nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    DerivesFrom,
    TransformsTo,
    CopiesFrom,
    AggregatesFrom,
}

impl RelationshipType {
    /// Get the string representation of the relationship type
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::DerivesFrom => "derives_from",
            RelationshipType::TransformsTo => "transforms_to",
            RelationshipType::CopiesFrom => "copies_from",
            RelationshipType::AggregatesFrom => "aggregates_from",
        }
    }

    /// Get all relationship types
    pub fn all() -> &'static [RelationshipType] {
        &[
            RelationshipType::DerivesFrom,
            RelationshipType::TransformsTo,
            RelationshipType::CopiesFrom,
            RelationshipType::AggregatesFrom,
        ]
    }
}

impl FromStr for RelationshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "derives_from" | "derives" => Ok(RelationshipType::DerivesFrom),
            "transforms_to" | "transforms" => Ok(RelationshipType::TransformsTo),
            "copies_from" | "copies" => Ok(RelationshipType::CopiesFrom),
            "aggregates_from" | "aggregates" => Ok(RelationshipType::AggregatesFrom),
            _ => Err(Error::Validation(format!("Unknown relationship type: {}", s))),
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed lineage edge between two nodes.
///
/// Confidence reflects how certain the producing heuristic was:
/// `1.0` for declared relationships, lower for inferred ones. Path
/// confidence is the product of edge confidences along the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Server-assigned identifier (UUID v4)
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub relationship: RelationshipType,
    /// Human-readable description of the transformation, if any
    pub transformation: Option<String>,
    /// Certainty of the relationship, in [0.0, 1.0]
    pub confidence: f32,
    /// Opaque key-value map, stored and returned verbatim
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

impl Edge {
    /// Materialize an edge from a creation spec, assigning id and audit
    /// timestamps. A missing confidence defaults to [`DEFAULT_CONFIDENCE`].
    pub fn from_spec(spec: EdgeSpec) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from_id: spec.from_id,
            to_id: spec.to_id,
            relationship: spec.relationship,
            transformation: spec.transformation,
            confidence: spec.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
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

    /// The (from, to, relationship) triple identifying this relationship
    pub fn triple(&self) -> (&str, &str, RelationshipType) {
        (&self.from_id, &self.to_id, self.relationship)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Caller-supplied fields for edge creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from_id: String,
    pub to_id: String,
    pub relationship: RelationshipType,
    #[serde(default)]
    pub transformation: Option<String>,
    /// Defaults to [`DEFAULT_CONFIDENCE`] when omitted
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl EdgeSpec {
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        relationship: RelationshipType,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            relationship,
            transformation: None,
            confidence: None,
            metadata: HashMap::new(),
            created_by: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_transformation(mut self, transformation: impl Into<String>) -> Self {
        self.transformation = Some(transformation.into());
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
}

/// Mutable fields for an edge update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgePatch {
    pub transformation: Option<String>,
    pub confidence: Option<f32>,
    pub metadata: Option<HashMap<String, Value>>,
}

impl EdgePatch {
    pub fn is_empty(&self) -> bool {
        self.transformation.is_none() && self.confidence.is_none() && self.metadata.is_none()
    }
}
