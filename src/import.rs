//! Bulk import coordinator - batched node creation with per-item isolation
//!
//! A batch runs as one unit of work: every item is validated and persisted
//! in order, rejected items land in an indexed error list without stopping
//! the batch, and only a backing-store failure aborts the remainder.

use crate::node::{Node, NodeSpec};
use crate::storage::SqliteStore;
use crate::validator::MutationValidator;
use crate::{Error, MAX_BULK_ITEMS, Result};
use serde::{Deserialize, Serialize};

/// Outcome of a bulk import
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BulkImportReport {
    /// Persisted nodes, in input order
    pub created: Vec<Node>,
    /// Rejected items with their zero-based input index
    pub errors: Vec<BulkItemError>,
}

impl BulkImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One rejected bulk item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    pub index: usize,
    pub error: String,
}

/// Apply a bounded batch of node creations inside one transaction.
///
/// Batches above [`MAX_BULK_ITEMS`] are rejected outright with no partial
/// processing. Item order is load-bearing: error indexes refer to input
/// positions, and later items are validated against earlier ones already
/// written in this transaction.
pub fn bulk_create_nodes(store: &SqliteStore, specs: Vec<NodeSpec>) -> Result<BulkImportReport> {
    if specs.len() > MAX_BULK_ITEMS {
        return Err(Error::Validation(format!(
            "bulk import of {} items exceeds the limit of {}",
            specs.len(),
            MAX_BULK_ITEMS
        )));
    }

    let tx = store.begin()?;
    let validator = MutationValidator::new(store);
    let mut report = BulkImportReport::default();

    for (index, spec) in specs.into_iter().enumerate() {
        match validator.validate_node(&spec) {
            Ok(()) => {
                let node = Node::from_spec(spec);
                store.insert_node(&node)?;
                report.created.push(node);
            }
            Err(err) if err.is_rejection() => {
                tracing::debug!(index, error = %err, "bulk import item rejected");
                report.errors.push(BulkItemError {
                    index,
                    error: err.to_string(),
                });
            }
            // store failure during validation aborts the batch
            Err(err) => return Err(err),
        }
    }

    tx.commit()?;
    Ok(report)
}
