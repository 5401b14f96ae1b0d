use crate::record::Record;
use crate::state::phase::CrawlPhase;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// `max_pages` listing pages were visited and another one was available
    MaxPagesReached,

    /// The last visited page had no next-page link
    NoNextPage,

    /// A later listing page could not be fetched; earlier pages are kept
    FatalError,

    /// The run was cancelled from outside
    Cancelled,
}

impl TerminationReason {
    /// True when the run ended before pagination was exhausted
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::FatalError | Self::Cancelled)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::MaxPagesReached => "max-pages-reached",
            Self::NoNextPage => "no-next-page",
            Self::FatalError => "fatal-error-partial",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "max-pages-reached" => Some(Self::MaxPagesReached),
            "no-next-page" => Some(Self::NoNextPage),
            "fatal-error-partial" => Some(Self::FatalError),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Transient state of one run, owned by the coordinator
///
/// Records only ever grow at the end, one whole page at a time, and a detail
/// address is accepted at most once per run.
#[derive(Debug)]
pub struct CrawlState {
    phase: CrawlPhase,

    /// 1-based number of the listing page being worked on
    pub current_page: u32,

    pub pages_visited: u32,
    records: Vec<Record>,
    seen_detail_urls: HashSet<String>,
    visited_listings: HashSet<String>,

    pub enrichment_failures: u32,
    pub degraded_items: u32,
    pub skipped_items: u32,
    pub duplicate_items: u32,

    started_at: DateTime<Utc>,
}

/// Final outcome of a run, handed to the sinks
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<Record>,
    pub pages_visited: u32,
    pub termination: TerminationReason,

    /// Whether detail enrichment was requested for this run
    pub deep: bool,

    pub enrichment_failures: u32,
    pub degraded_items: u32,
    pub skipped_items: u32,
    pub duplicate_items: u32,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            phase: CrawlPhase::Start,
            current_page: 1,
            pages_visited: 0,
            records: Vec::new(),
            seen_detail_urls: HashSet::new(),
            visited_listings: HashSet::new(),
            enrichment_failures: 0,
            degraded_items: 0,
            skipped_items: 0,
            duplicate_items: 0,
            started_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves the state machine; an illegal move leaves the phase untouched
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), (CrawlPhase, CrawlPhase)> {
        if !self.phase.can_transition_to(next) {
            return Err((self.phase, next));
        }
        tracing::trace!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Records a listing address as visited; false if it was seen before
    pub fn mark_listing_visited(&mut self, url: &str) -> bool {
        self.visited_listings.insert(url.to_string())
    }

    pub fn has_visited_listing(&self, url: &str) -> bool {
        self.visited_listings.contains(url)
    }

    /// Claims a detail address for this run; false for a duplicate
    pub fn claim_detail_url(&mut self, url: &str) -> bool {
        self.seen_detail_urls.insert(url.to_string())
    }

    /// Appends one fully processed page and advances the page counter
    pub fn append_page(&mut self, records: Vec<Record>) {
        self.records.extend(records);
        self.pages_visited += 1;
        self.current_page += 1;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn has_progress(&self) -> bool {
        self.pages_visited > 0
    }

    /// Consumes the state into the report handed to sinks
    pub fn finish(self, termination: TerminationReason, deep: bool) -> CrawlReport {
        CrawlReport {
            records: self.records,
            pages_visited: self.pages_visited,
            termination,
            deep,
            enrichment_failures: self.enrichment_failures,
            degraded_items: self.degraded_items,
            skipped_items: self.skipped_items,
            duplicate_items: self.duplicate_items,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlReport {
    pub fn is_partial(&self) -> bool {
        self.termination.is_partial()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
