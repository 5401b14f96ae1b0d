//! Global request pacing
//!
//! One pacer belongs to one fetcher and therefore to one run. It remembers
//! when the previous request finished and makes the next one wait until the
//! configured floor has passed, whatever the request is for.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Enforces a minimum gap between consecutive outbound requests
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Minimum time between the end of one request and the start of the next
    min_interval: Duration,

    /// When the previous request finished; `None` before the first one
    last_request: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Records that a request just finished
    pub fn record_request(&mut self, now: Instant) {
        self.last_request = Some(now);
    }

    /// Time left before another request may start
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until the floor has passed
    ///
    /// Returns false if `cancel` fired while waiting.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let Some(remaining) = self.time_until_next(Instant::now()) else {
            return true;
        };

        tracing::trace!("Pacing: waiting {:?} before next request", remaining);

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(remaining) => true,
        }
    }
}
