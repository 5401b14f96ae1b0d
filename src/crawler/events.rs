//! Progress events emitted by the coordinator
//!
//! Front ends subscribe with an unbounded channel; sending never blocks the
//! crawl, and a dropped receiver is ignored.

use crate::state::TerminationReason;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A listing page body arrived
    PageFetched { page: u32, url: String },

    /// A listing page was parsed
    PageParsed {
        page: u32,
        items: usize,
        has_next: bool,
    },

    /// A detail page was fetched and parsed (deep mode)
    ItemEnriched {
        page: u32,
        index: usize,
        total: usize,
        title: String,
    },

    /// A detail page failed; the record is kept without detail fields
    EnrichmentFailed {
        page: u32,
        index: usize,
        url: String,
        error: String,
    },

    /// A listing page could not be fetched
    PageFailed {
        page: u32,
        url: String,
        error: String,
    },

    /// The run is over
    Finished {
        records: usize,
        pages_visited: u32,
        termination: TerminationReason,
    },
}

pub type EventSender = UnboundedSender<ProgressEvent>;
