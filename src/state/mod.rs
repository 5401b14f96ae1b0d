//! State module for tracking crawl progress
//!
//! This module provides the transient, per-run state owned by the coordinator.
//!
//! # Components
//!
//! - `CrawlPhase`: Where the coordinator is in its state machine
//! - `CrawlState`: Page counter, accumulated records and failure counters
//! - `CrawlReport`: The finished run, as handed to record sinks
//! - `TerminationReason`: Why pagination stopped

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlReport, CrawlState, TerminationReason};
pub use phase::CrawlPhase;
