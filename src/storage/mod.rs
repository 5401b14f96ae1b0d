//! Storage module for persisting harvested records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run bookkeeping (timestamps, config hash, termination, counters)
//! - Record persistence and read-back for previews

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::TerminationReason;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a finished run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: String,
    pub termination: Option<TerminationReason>,
    pub deep: bool,
    pub pages_visited: u32,
    pub record_count: u64,
    pub enrichment_failures: u32,
    pub degraded_items: u32,
    pub skipped_items: u32,
    pub duplicate_items: u32,
}

/// Represents one stored catalogue record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRow {
    pub id: i64,
    pub run_id: i64,
    pub title: String,
    pub price: String,

    /// Decimal amount as text; None when the price could not be parsed
    pub price_amount: Option<String>,

    /// 1-5, or 0 for an unknown rating
    pub rating: u8,
    pub availability: u32,
    pub product_url: String,

    /// Detail columns; None for records without detail fields
    pub upc: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}
