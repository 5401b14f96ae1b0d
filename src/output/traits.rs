//! Output sink traits and types
//!
//! This module defines the trait interface for record sinks and the
//! associated error types.

use crate::state::CrawlReport;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination for a finished run's records
///
/// Sinks receive the whole report at once, after the crawl is over, and
/// either write every record or fail.
pub trait RecordSink {
    /// Short name used in log lines, e.g. `csv`
    fn name(&self) -> &'static str;

    /// Writes the report's records
    ///
    /// Detail columns are included only when `report.deep` is set.
    ///
    /// # Returns
    ///
    /// The number of records written
    fn write_records(&mut self, report: &CrawlReport) -> OutputResult<usize>;

    /// Reads back up to `limit` rows for the post-run preview
    fn sample(&self, limit: usize) -> OutputResult<Vec<SampleRow>>;
}

/// One line of the post-run preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub title: String,
    pub price: String,
    pub rating: String,
}
