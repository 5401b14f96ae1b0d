//! Retry decisions for failed fetch attempts
//!
//! Everything here is a pure function of the attempt number and the kind of
//! failure, so the whole backoff schedule can be tested without a network.
//!
//! | Failure | Kind | Delay before next attempt |
//! |---------|------|---------------------------|
//! | Timeout | Transient | `base * 2^(attempt-1)`, capped |
//! | Connection error | Transient | same |
//! | HTTP 5xx, 408 | Transient | same |
//! | HTTP 429 | RateLimited | `Retry-After` if sent, else the exponential delay |
//! | Other 4xx | Permanent | none, fail immediately |
//! | Cancelled | Permanent | none |

use crate::config::FetchConfig;
use crate::crawler::fetcher::FetchError;
use std::time::{Duration, SystemTime};

/// Upper bound honoured for a server-provided `Retry-After`
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// How a failed attempt should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// May succeed if tried again
    Transient,

    /// Server asked us to slow down, possibly saying for how long
    RateLimited { retry_after: Option<Duration> },

    /// Will not succeed no matter how often it is retried
    Permanent,
}

/// Outcome of [`RetryPolicy::decide`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is the number of the next attempt
    Retry { delay: Duration, attempt: u32 },

    /// Stop and report the last error
    GiveUp { reason: String },
}

/// Attempt budget and exponential backoff schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` counts the first attempt and is at least 1
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.backoff_base(),
            config.backoff_max(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after attempt number `attempt` (1-based) failed
    pub fn decide(&self, failure: FailureKind, attempt: u32) -> RetryDecision {
        if failure == FailureKind::Permanent {
            return RetryDecision::GiveUp {
                reason: "non-retryable failure".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = match failure {
            FailureKind::RateLimited {
                retry_after: Some(hint),
            } => hint.min(MAX_RETRY_AFTER),
            _ => self.backoff(attempt),
        };

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Exponential delay after attempt number `attempt`: base, 2×base, 4×base, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Classifies a fetch error for the retry decision
pub fn classify(error: &FetchError) -> FailureKind {
    match error {
        FetchError::Timeout { .. } => FailureKind::Transient,
        FetchError::Connection { .. } => FailureKind::Transient,
        FetchError::HttpStatus {
            status,
            retry_after,
            ..
        } => classify_status(*status, *retry_after),
        FetchError::Cancelled { .. } => FailureKind::Permanent,
    }
}

/// Classifies an HTTP status code
#[allow(clippy::match_same_arms)]
fn classify_status(status: u16, retry_after: Option<Duration>) -> FailureKind {
    match status {
        408 => FailureKind::Transient,
        429 => FailureKind::RateLimited { retry_after },
        400..=499 => FailureKind::Permanent,
        500..=599 => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date)
///
/// Negative or past values are ignored; anything above [`MAX_RETRY_AFTER`] is capped.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<i64>() {
        if seconds < 0 {
            return None;
        }
        return Some(Duration::from_secs(seconds as u64).min(MAX_RETRY_AFTER));
    }

    let when = httpdate::parse_http_date(value).ok()?;
    when.duration_since(SystemTime::now())
        .ok()
        .map(|d| d.min(MAX_RETRY_AFTER))
}
