use serde::Deserialize;
use crate::ConfigError;
use std::time::Duration;

/// Longest accepted pacing delay, in seconds
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Default first listing page of the reference catalogue
pub const DEFAULT_START_URL: &str = "https://books.toscrape.com/catalogue/page-1.html";

/// Main configuration structure for Shelf-Harvest
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults the command-line tool has always used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Run configuration consumed by the crawl coordinator
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Address of the first listing page
    #[serde(rename = "start-url", default = "default_start_url")]
    pub start_url: String,

    /// Maximum number of listing pages to visit
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Minimum gap between consecutive requests (seconds)
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Fetch every item's detail page for UPC, category and description
    #[serde(default)]
    pub deep: bool,
}

/// HTTP fetch behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per address, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for any single backoff (milliseconds)
    #[serde(rename = "backoff-max-ms", default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// CSV destination; `None` disables the CSV sink
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: Option<String>,

    /// SQLite destination; `None` disables the SQLite sink
    #[serde(rename = "sqlite-path", default)]
    pub sqlite_path: Option<String>,
}

impl CrawlerConfig {
    /// The pacing floor as a `Duration`
    pub fn delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.delay).map_err(|e| {
            ConfigError::Validation(format!("delay {} is not a usable duration: {}", self.delay, e))
        })
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            max_pages: default_max_pages(),
            delay: default_delay(),
            deep: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            sqlite_path: None,
        }
    }
}

fn default_start_url() -> String {
    DEFAULT_START_URL.to_string()
}

fn default_max_pages() -> u32 {
    3
}

fn default_delay() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    32_000
}

fn default_crawler_name() -> String {
    "ShelfHarvest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/shelf-harvest/shelf-harvest".to_string()
}

fn default_csv_path() -> Option<String> {
    Some("books.csv".to_string())
}
