//! Crawler module for catalogue fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and request pacing
//! - Listing and detail page parsing
//! - Overall crawl coordination and progress events

mod coordinator;
mod detail;
mod events;
mod fetcher;
mod pacer;
mod parser;
mod retry;

pub use coordinator::Coordinator;
pub use detail::{parse_detail, DetailParseError};
pub use events::{EventSender, ProgressEvent};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use pacer::Pacer;
pub use parser::{parse_listing, ListingPage};
pub use retry::{classify, parse_retry_after, FailureKind, RetryDecision, RetryPolicy};

use crate::config::Config;
use crate::state::CrawlReport;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// Convenience wrapper for callers that need neither progress events nor
/// external cancellation.
///
/// # Arguments
///
/// * `config` - The validated run configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished, possibly with partial results
/// * `Err(HarvestError)` - The first listing page could not be fetched
pub async fn crawl(config: &Config) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config, CancellationToken::new())?.run().await
}
