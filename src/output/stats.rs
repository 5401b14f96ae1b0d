//! Post-run preview and summary
//!
//! Prints the first few stored rows back out of each sink, then a short
//! account of how the run went.

use crate::output::traits::SampleRow;
use crate::state::CrawlReport;

/// Rows shown per sink in the preview
pub const SAMPLE_SIZE: usize = 5;

/// Longest title shown in the preview, in characters
pub const TITLE_WIDTH: usize = 50;

/// Shortens a title to [`TITLE_WIDTH`] characters, marking the cut with `...`
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        title.to_string()
    } else {
        let kept: String = title.chars().take(TITLE_WIDTH).collect();
        format!("{}...", kept)
    }
}

/// Renders preview rows, one per line
pub fn format_sample(rows: &[SampleRow]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "{}. {} | Price: {} | Rating: {}",
                i + 1,
                truncate_title(&row.title),
                row.price,
                row.rating
            )
        })
        .collect()
}

/// Prints preview rows read back from one sink
///
/// # Arguments
///
/// * `source` - Label for the sink, e.g. the file path
/// * `rows` - Rows to show
pub fn print_sample(source: &str, rows: &[SampleRow]) {
    println!("\n=== Sample from {} ===", source);
    if rows.is_empty() {
        println!("  (no rows)");
        return;
    }
    for line in format_sample(rows) {
        println!("  {}", line);
    }
}

/// Prints the run summary to stdout
pub fn print_run_summary(report: &CrawlReport) {
    println!("\n=== Run Summary ===\n");
    println!("  Records scraped: {}", report.records.len());
    println!("  Pages visited: {}", report.pages_visited);
    println!("  Termination: {}", report.termination);
    println!("  Deep mode: {}", if report.deep { "yes" } else { "no" });
    println!("  Duration: {}s", report.duration_seconds());

    if report.enrichment_failures > 0 {
        println!("  Detail pages failed: {}", report.enrichment_failures);
    }
    if report.degraded_items > 0 {
        println!("  Items with fallback values: {}", report.degraded_items);
    }
    if report.skipped_items > 0 {
        println!("  Items skipped (no detail link): {}", report.skipped_items);
    }
    if report.duplicate_items > 0 {
        println!("  Duplicate items dropped: {}", report.duplicate_items);
    }
    if report.is_partial() {
        println!("\n  Note: the run ended early; results are partial.");
    }
}
