//! SQLite-based record sink
//!
//! This module provides a sink that stores a finished run and its records
//! through the [`Storage`] backend.

use crate::output::traits::{OutputResult, RecordSink, SampleRow};
use crate::state::CrawlReport;
use crate::storage::{SqliteStorage, Storage};
use std::path::Path;

/// SQLite-based record sink
///
/// Each call to [`RecordSink::write_records`] adds one run; earlier runs in
/// the same database are left alone.
pub struct SqliteSink<S: Storage = SqliteStorage> {
    storage: S,
    config_hash: String,
    last_run: Option<i64>,
}

impl SqliteSink<SqliteStorage> {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration, recorded with the run
    pub fn open(path: &Path, config_hash: impl Into<String>) -> OutputResult<Self> {
        Ok(Self::new(SqliteStorage::new(path)?, config_hash))
    }
}

impl<S: Storage> SqliteSink<S> {
    pub fn new(storage: S, config_hash: impl Into<String>) -> Self {
        Self {
            storage,
            config_hash: config_hash.into(),
            last_run: None,
        }
    }

    /// ID of the run written by the last successful call
    pub fn last_run(&self) -> Option<i64> {
        self.last_run
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: Storage> RecordSink for SqliteSink<S> {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write_records(&mut self, report: &CrawlReport) -> OutputResult<usize> {
        let run_id = self.storage.save_report(&self.config_hash, report)?;
        self.last_run = Some(run_id);

        tracing::info!("Saved {} records to database as run {}", report.records.len(), run_id);
        Ok(report.records.len())
    }

    fn sample(&self, limit: usize) -> OutputResult<Vec<SampleRow>> {
        let run_id = match self.last_run {
            Some(id) => id,
            None => match self.storage.get_latest_run()? {
                Some(run) => run.id,
                None => return Ok(Vec::new()),
            },
        };

        let rows = self
            .storage
            .load_books(run_id, Some(limit))?
            .into_iter()
            .map(|book| SampleRow {
                title: book.title,
                price: book.price,
                rating: book.rating.to_string(),
            })
            .collect();
        Ok(rows)
    }
}
