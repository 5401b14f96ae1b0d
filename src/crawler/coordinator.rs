//! Crawl coordinator
//!
//! The coordinator drives one run through the phase machine in
//! [`crate::state::CrawlPhase`]: fetch a listing page, parse it, optionally
//! enrich each item from its detail page, append the page, follow the next
//! link. It owns the [`CrawlState`] and the [`Fetcher`], so the whole run
//! proceeds on a single logical thread with one request in flight.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::detail::{parse_detail, DetailParseError};
use crate::crawler::events::{EventSender, ProgressEvent};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::parser::parse_listing;
use crate::record::{DetailFields, Record};
use crate::state::{CrawlPhase, CrawlReport, CrawlState, TerminationReason};
use crate::url::normalize_url;
use crate::HarvestError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why one item's detail page yielded nothing
#[derive(Debug, Error)]
enum EnrichmentError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Parse(#[from] DetailParseError),

    #[error("bad detail address: {0}")]
    Address(#[from] url::ParseError),
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: CrawlerConfig,
    fetcher: Fetcher,
    cancel: CancellationToken,
    events: Option<EventSender>,
}

impl Coordinator {
    /// Creates a coordinator with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `cancel` - Token that stops the run from outside
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(config, cancel.clone())?;
        Ok(Self::with_fetcher(config.crawler.clone(), fetcher, cancel))
    }

    /// Creates a coordinator around an existing fetcher
    ///
    /// The fetcher should observe the same cancellation token.
    pub fn with_fetcher(config: CrawlerConfig, fetcher: Fetcher, cancel: CancellationToken) -> Self {
        Self {
            config,
            fetcher,
            cancel,
            events: None,
        }
    }

    /// Subscribes a channel to progress events
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Pagination ended, the run was cancelled, or a
    ///   later listing page failed after at least one page was accumulated
    /// * `Err(HarvestError::FatalCrawl)` - The first listing page could not be fetched
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let mut state = CrawlState::new();
        let deep = self.config.deep;
        let mut page_url = normalize_url(&self.config.start_url)?;

        tracing::info!(
            "Starting crawl at {} (max {} pages, deep: {}, delay: {}s)",
            page_url,
            self.config.max_pages,
            deep,
            self.config.delay
        );

        let termination = loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancellation requested, stopping before page {}", state.current_page);
                break TerminationReason::Cancelled;
            }

            state.mark_listing_visited(page_url.as_str());
            self.transition(&mut state, CrawlPhase::FetchingListing)?;
            let page = state.current_page;
            tracing::info!("Crawling page {}: {}", page, page_url);

            let html = match self.fetcher.fetch(&page_url).await {
                Ok(html) => html,
                Err(error) if error.is_cancelled() => {
                    tracing::info!("Cancelled while fetching page {}", page);
                    break TerminationReason::Cancelled;
                }
                Err(error) => {
                    tracing::error!("Failed to fetch page {}: {}", page, error);
                    self.emit(ProgressEvent::PageFailed {
                        page,
                        url: page_url.to_string(),
                        error: error.to_string(),
                    });

                    if !state.has_progress() {
                        self.transition(&mut state, CrawlPhase::Aborted)?;
                        return Err(HarvestError::FatalCrawl {
                            url: page_url.to_string(),
                            source: error,
                        });
                    }
                    break TerminationReason::FatalError;
                }
            };
            self.emit(ProgressEvent::PageFetched {
                page,
                url: page_url.to_string(),
            });

            self.transition(&mut state, CrawlPhase::ParsingListing)?;
            let listing = parse_listing(&html, &page_url);
            state.degraded_items += listing.degraded;
            state.skipped_items += listing.skipped;
            tracing::info!("Found {} books on page {}", listing.records.len(), page);
            self.emit(ProgressEvent::PageParsed {
                page,
                items: listing.records.len(),
                has_next: listing.next_page.is_some(),
            });

            let mut records = Vec::with_capacity(listing.records.len());
            for record in listing.records {
                if state.claim_detail_url(&record.detail_url) {
                    records.push(record);
                } else {
                    tracing::debug!("Dropping duplicate item {}", record.detail_url);
                    state.duplicate_items += 1;
                }
            }

            if deep {
                self.transition(&mut state, CrawlPhase::EnrichingDetail)?;
                match self.enrich_page(&mut state, page, records).await {
                    Some(enriched) => records = enriched,
                    None => {
                        tracing::info!("Cancelled during enrichment, discarding page {}", page);
                        break TerminationReason::Cancelled;
                    }
                }
            }

            self.transition(&mut state, CrawlPhase::AccumulatingPage)?;
            state.append_page(records);

            let Some(next) = listing.next_page else {
                tracing::info!("No next page after page {}", page);
                break TerminationReason::NoNextPage;
            };

            if state.pages_visited >= self.config.max_pages {
                tracing::info!("Reached max pages limit ({})", self.config.max_pages);
                break TerminationReason::MaxPagesReached;
            }

            if state.has_visited_listing(next.as_str()) {
                tracing::warn!("Next link {} points to an already visited page, stopping", next);
                break TerminationReason::NoNextPage;
            }

            page_url = next;
        };

        let final_phase = if termination.is_partial() {
            CrawlPhase::Aborted
        } else {
            CrawlPhase::Done
        };
        self.transition(&mut state, final_phase)?;

        let report = state.finish(termination, deep);
        tracing::info!(
            "Crawl finished: {} records from {} pages ({})",
            report.records.len(),
            report.pages_visited,
            report.termination
        );
        self.emit(ProgressEvent::Finished {
            records: report.records.len(),
            pages_visited: report.pages_visited,
            termination: report.termination,
        });

        Ok(report)
    }

    /// Enriches one page's records in order
    ///
    /// Returns None if the run was cancelled part way through.
    async fn enrich_page(
        &mut self,
        state: &mut CrawlState,
        page: u32,
        records: Vec<Record>,
    ) -> Option<Vec<Record>> {
        let total = records.len();
        let mut enriched = Vec::with_capacity(total);

        for (index, record) in records.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return None;
            }

            tracing::debug!("Fetching details for book {}/{}: {}", index + 1, total, record.title);

            match self.fetch_detail(&record.detail_url).await {
                Ok(detail) => {
                    self.emit(ProgressEvent::ItemEnriched {
                        page,
                        index,
                        total,
                        title: record.title.clone(),
                    });
                    enriched.push(record.with_detail(detail));
                }
                Err(EnrichmentError::Fetch(error)) if error.is_cancelled() => return None,
                Err(error) => {
                    tracing::warn!("Failed to get details for {}: {}", record.detail_url, error);
                    state.enrichment_failures += 1;
                    self.emit(ProgressEvent::EnrichmentFailed {
                        page,
                        index,
                        url: record.detail_url.clone(),
                        error: error.to_string(),
                    });
                    enriched.push(record);
                }
            }
        }

        Some(enriched)
    }

    async fn fetch_detail(&mut self, detail_url: &str) -> Result<DetailFields, EnrichmentError> {
        let url = Url::parse(detail_url)?;
        let html = self.fetcher.fetch(&url).await?;
        Ok(parse_detail(&html)?)
    }

    fn transition(&self, state: &mut CrawlState, next: CrawlPhase) -> Result<(), HarvestError> {
        state
            .transition(next)
            .map_err(|(from, to)| HarvestError::InvalidTransition { from, to })
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
