//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{CrawlReport, TerminationReason};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{BookRow, RunRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, termination, deep, \
     pages_visited, record_count, enrichment_failures, degraded_items, skipped_items, duplicate_items";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        termination: TerminationReason::from_db_string(&row.get::<_, String>(4)?),
        deep: row.get(5)?,
        pages_visited: row.get(6)?,
        record_count: row.get::<_, i64>(7)? as u64,
        enrichment_failures: row.get(8)?,
        degraded_items: row.get(9)?,
        skipped_items: row.get(10)?,
        duplicate_items: row.get(11)?,
    })
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        run_id: row.get(1)?,
        title: row.get(2)?,
        price: row.get(3)?,
        price_amount: row.get(4)?,
        rating: row.get(5)?,
        availability: row.get(6)?,
        product_url: row.get(7)?,
        upc: row.get(8)?,
        category: row.get(9)?,
        description: row.get(10)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn save_report(&mut self, config_hash: &str, report: &CrawlReport) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (started_at, finished_at, config_hash, termination, deep,
                               pages_visited, record_count, enrichment_failures,
                               degraded_items, skipped_items, duplicate_items)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                config_hash,
                report.termination.to_db_string(),
                report.deep,
                report.pages_visited,
                report.records.len() as i64,
                report.enrichment_failures,
                report.degraded_items,
                report.skipped_items,
                report.duplicate_items,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO books (run_id, title, price, price_amount, rating, availability,
                                    product_url, upc, category, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for record in &report.records {
                stmt.execute(params![
                    run_id,
                    record.title,
                    record.price.display,
                    record.price.amount.map(|a| a.to_string()),
                    record.rating.as_column(),
                    record.availability,
                    record.detail_url,
                    record.upc(),
                    record.category(),
                    record.description(),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Saved run {} with {} records", run_id, report.records.len());
        Ok(run_id)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    // ===== Records =====

    fn load_books(&self, run_id: i64, limit: Option<usize>) -> StorageResult<Vec<BookRow>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, title, price, price_amount, rating, availability,
                    product_url, upc, category, description
             FROM books WHERE run_id = ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![run_id, limit], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count_books(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM books WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_books(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
