//! Mutation validation - structural invariant checks run before commit
//!
//! Every edge insert passes four checks in a fixed order: self-reference,
//! endpoint existence, duplicate triple, cycle. The order is part of the
//! contract: a duplicate must be reported as a duplicate even when the
//! graph around it would also fail a later check.

use crate::edge::EdgeSpec;
use crate::node::NodeSpec;
use crate::storage::SqliteStore;
use crate::{Error, MAX_TRAVERSAL_DEPTH, Result};
use std::collections::{HashSet, VecDeque};

/// Invariant checks against the graph store.
///
/// Runs inside the caller's transaction so its reads are consistent with
/// the write that follows. The partial unique indexes in the store remain
/// the backstop for concurrent writers racing past these checks.
pub struct MutationValidator<'a> {
    store: &'a SqliteStore,
}

impl<'a> MutationValidator<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Validate a node creation spec
    pub fn validate_node(&self, spec: &NodeSpec) -> Result<()> {
        if spec.label.trim().is_empty() {
            return Err(Error::Validation("node label must not be empty".into()));
        }
        if let (Some(source), Some(schema), Some(table)) =
            (&spec.data_source, &spec.schema_name, &spec.table_name)
        {
            if self
                .store
                .find_node_by_identity(source, schema, table)?
                .is_some()
            {
                return Err(Error::Duplicate(format!(
                    "node for {}.{}.{} already exists",
                    source, schema, table
                )));
            }
        }
        Ok(())
    }

    /// Validate an edge creation spec. Check order: self-reference,
    /// existence, duplicate, cycle.
    pub fn validate_edge(&self, spec: &EdgeSpec) -> Result<()> {
        if let Some(confidence) = spec.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::Validation(format!(
                    "confidence {} is outside [0.0, 1.0]",
                    confidence
                )));
            }
        }

        if spec.from_id == spec.to_id {
            return Err(Error::SelfReference(format!(
                "edge from {} to itself is not allowed",
                spec.from_id
            )));
        }

        let from = self.store.get_node(&spec.from_id)?;
        let to = self.store.get_node(&spec.to_id)?;
        match (from.is_some(), to.is_some()) {
            (true, true) => {}
            (false, true) => {
                return Err(Error::NotFound(format!("node {} not found", spec.from_id)));
            }
            (true, false) => {
                return Err(Error::NotFound(format!("node {} not found", spec.to_id)));
            }
            (false, false) => {
                return Err(Error::NotFound(format!(
                    "nodes {} and {} not found",
                    spec.from_id, spec.to_id
                )));
            }
        }

        if self
            .store
            .find_edge_triple(&spec.from_id, &spec.to_id, spec.relationship)?
            .is_some()
        {
            return Err(Error::Duplicate(format!(
                "edge {} -> {} ({}) already exists",
                spec.from_id, spec.to_id, spec.relationship
            )));
        }

        if self.is_reachable(&spec.to_id, &spec.from_id)? {
            return Err(Error::Cycle(format!(
                "edge {} -> {} would close a cycle",
                spec.from_id, spec.to_id
            )));
        }

        Ok(())
    }

    /// Bounded BFS over Active edges: is `target` reachable from `start`
    /// within [`MAX_TRAVERSAL_DEPTH`] hops?
    fn is_reachable(&self, start: &str, target: &str) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back((start.to_string(), 0usize));
        visited.insert(start.to_string());

        while let Some((current, depth)) = queue.pop_front() {
            if current == target {
                return Ok(true);
            }
            if depth >= MAX_TRAVERSAL_DEPTH {
                continue;
            }
            for edge in self.store.active_edges_from(&current)? {
                if visited.insert(edge.to_id.clone()) {
                    queue.push_back((edge.to_id, depth + 1));
                }
            }
        }

        Ok(false)
    }
}
