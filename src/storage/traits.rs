//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::CrawlReport;
use crate::storage::{BookRow, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A run is persisted once, after it has finished: the run row and all of
/// its records are written together or not at all.
pub trait Storage {
    // ===== Run Management =====

    /// Persists a finished run and its records in one transaction
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration the run used
    /// * `report` - The finished run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn save_report(&mut self, config_hash: &str, report: &CrawlReport) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Records =====

    /// Loads a run's records in crawl order, at most `limit` if given
    fn load_books(&self, run_id: i64, limit: Option<usize>) -> StorageResult<Vec<BookRow>>;

    /// Counts the records stored for one run
    fn count_books(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts all records across runs
    fn count_total_books(&self) -> StorageResult<u64>;
}
