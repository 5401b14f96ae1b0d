//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Pacing consecutive requests through a shared [`Pacer`]
//! - Retrying transient failures per [`RetryPolicy`]
//! - Error classification into [`FetchError`]
//!
//! Every wait (pacing, backoff, the request itself) aborts promptly when the
//! run's cancellation token fires.

use crate::config::{Config, FetchConfig, UserAgentConfig};
use crate::crawler::pacer::Pacer;
use crate::crawler::retry::{classify, parse_retry_after, RetryDecision, RetryPolicy};
use crate::HarvestError;
use reqwest::header::RETRY_AFTER;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Why a page could not be retrieved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus {
        url: String,
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Maps a reqwest transport error
    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if let Some(status) = error.status() {
            Self::HttpStatus {
                url,
                status: status.as_u16(),
                retry_after: None,
            }
        } else {
            Self::Connection {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetch` - Timeout settings
/// * `user_agent` - Identity sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    fetch: &FetchConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(fetch.timeout())
        .connect_timeout(fetch.timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves page bodies for one run
///
/// A fetcher owns the run's pacer, so listing and detail requests share the
/// same minimum gap.
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    pacer: Pacer,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(
        client: Client,
        policy: RetryPolicy,
        pacer: Pacer,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            policy,
            pacer,
            cancel,
        }
    }

    /// Builds a fetcher from the full configuration
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.fetch, &config.user_agent)?;
        Ok(Self::new(
            client,
            RetryPolicy::from_config(&config.fetch),
            Pacer::new(config.crawler.delay()?),
            cancel,
        ))
    }

    /// Fetches `url` and returns its body as text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 429 | Retry after `Retry-After` (or backoff) |
    /// | HTTP 5xx, 408 | Retry with exponential backoff |
    /// | Other HTTP 4xx | Fail immediately |
    /// | Timeout, connection error | Retry with exponential backoff |
    /// | Cancellation | Fail immediately with `Cancelled` |
    ///
    /// The pacing floor is honoured before every attempt, retries included.
    pub async fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        let cancelled = || FetchError::Cancelled {
            url: url.to_string(),
        };
        let mut attempt = 1;

        loop {
            if !self.pacer.wait(&self.cancel).await {
                return Err(cancelled());
            }

            debug!(
                "GET {} (attempt {}/{})",
                url,
                attempt,
                self.policy.max_attempts()
            );

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(cancelled()),
                result = self.attempt(url) => result,
            };
            self.pacer.record_request(Instant::now());

            let error = match outcome {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            match self.policy.decide(classify(&error), attempt) {
                RetryDecision::Retry { delay, attempt: next } => {
                    warn!(
                        "Attempt {} for {} failed: {}; retrying in {:?}",
                        attempt, url, error, delay
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(cancelled()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt = next;
                }
                RetryDecision::GiveUp { reason } => {
                    if !error.is_cancelled() {
                        warn!("Giving up on {}: {} ({})", url, error, reason);
                    }
                    return Err(error);
                }
            }
        }
    }

    /// One request, no retries
    async fn attempt(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                retry_after,
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}
