//! Storage layer - SQLite-backed source of truth for the lineage graph

pub mod schema;
pub mod sqlite;

pub use sqlite::{GraphStatistics, SqliteStore};
