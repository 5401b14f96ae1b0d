//! CSV record sink

use crate::output::columns;
use crate::output::traits::{OutputResult, RecordSink, SampleRow};
use crate::record::Record;
use crate::state::CrawlReport;
use std::path::{Path, PathBuf};

/// Writes records to a CSV file with a header row
///
/// An existing file at the path is replaced.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn row(record: &Record, deep: bool) -> Vec<String> {
    let mut fields = vec![
        record.title.clone(),
        record.price.display.clone(),
        record.rating.as_column().to_string(),
        record.availability.to_string(),
        record.detail_url.clone(),
    ];

    if deep {
        fields.push(record.upc().unwrap_or_default().to_string());
        fields.push(record.category().unwrap_or_default().to_string());
        fields.push(record.description().unwrap_or_default().to_string());
    }

    fields
}

impl RecordSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write_records(&mut self, report: &CrawlReport) -> OutputResult<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(columns(report.deep))?;
        for record in &report.records {
            writer.write_record(row(record, report.deep))?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} records to {}",
            report.records.len(),
            self.path.display()
        );
        Ok(report.records.len())
    }

    fn sample(&self, limit: usize) -> OutputResult<Vec<SampleRow>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let index = |name: &str| headers.iter().position(|h| h == name);
        let (title, price, rating) = (index("title"), index("price"), index("rating"));

        let mut rows = Vec::new();
        for result in reader.records().take(limit) {
            let record = result?;
            let field = |i: Option<usize>| {
                i.and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_string()
            };
            rows.push(SampleRow {
                title: field(title),
                price: field(price),
                rating: field(rating),
            });
        }
        Ok(rows)
    }
}
