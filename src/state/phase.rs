/// Phase definitions for the crawl state machine
///
/// `Start → FetchingListing → ParsingListing → {EnrichingDetail}* →
/// AccumulatingPage → (FetchingListing | Done)`, with `Aborted` reachable from
/// every non-terminal phase.
use std::fmt;

/// Represents where the coordinator currently is in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Run created, nothing requested yet
    Start,

    /// Waiting on a listing page
    FetchingListing,

    /// Turning listing HTML into records
    ParsingListing,

    /// Fetching and parsing detail pages (deep mode only)
    EnrichingDetail,

    /// Appending the page's records to the run
    AccumulatingPage,

    // ===== Terminal Phases =====
    /// Pagination ended normally
    Done,

    /// Run stopped by a fetch failure or cancellation
    Aborted,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Checks whether the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if self.is_terminal() {
            return false;
        }

        match (*self, next) {
            (_, Aborted) => true,
            (Start, FetchingListing) => true,
            (FetchingListing, ParsingListing) => true,
            (ParsingListing, EnrichingDetail) => true,
            (ParsingListing, AccumulatingPage) => true,
            (EnrichingDetail, AccumulatingPage) => true,
            (AccumulatingPage, FetchingListing) => true,
            (AccumulatingPage, Done) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingListing => "fetching_listing",
            Self::ParsingListing => "parsing_listing",
            Self::EnrichingDetail => "enriching_detail",
            Self::AccumulatingPage => "accumulating_page",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
