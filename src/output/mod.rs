//! Output module for writing harvested records
//!
//! This module handles:
//! - Writing records to CSV and SQLite sinks
//! - Reading a sample back for the post-run preview
//! - Printing the run summary

mod csv_output;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use sqlite_output::SqliteSink;
pub use stats::{print_run_summary, print_sample, SAMPLE_SIZE};
pub use traits::{OutputError, OutputResult, RecordSink, SampleRow};

const SUMMARY_COLUMNS: [&str; 5] = ["title", "price", "rating", "availability", "product_url"];
const DETAIL_COLUMNS: [&str; 3] = ["upc", "category", "description"];

/// Output column names in their fixed order
///
/// Detail columns are present only for deep-mode runs.
pub fn columns(deep: bool) -> Vec<&'static str> {
    let mut names = SUMMARY_COLUMNS.to_vec();
    if deep {
        names.extend(DETAIL_COLUMNS);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns() {
        assert_eq!(
            columns(false),
            ["title", "price", "rating", "availability", "product_url"]
        );
        assert_eq!(
            columns(true),
            [
                "title",
                "price",
                "rating",
                "availability",
                "product_url",
                "upc",
                "category",
                "description"
            ]
        );
    }
}
