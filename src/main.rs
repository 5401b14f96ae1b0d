//! Shelf-Harvest main entry point
//!
//! This is the command-line interface for the Shelf-Harvest catalogue scraper.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use shelf_harvest::config::{compute_config_hash, load_config, validate, Config};
use shelf_harvest::output::{self, print_run_summary, print_sample, CsvSink, RecordSink, SqliteSink, SAMPLE_SIZE};
use shelf_harvest::{Coordinator, ProgressEvent};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Harvest: a polite catalogue scraper
///
/// Walks a paginated product catalogue, optionally visits every item's detail
/// page, and writes the records to CSV and/or SQLite.
#[derive(Parser, Debug)]
#[command(name = "shelf-harvest")]
#[command(version)]
#[command(about = "A polite paginated catalogue scraper", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of listing pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Minimum delay between requests, in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Fetch each item's detail page for UPC, category and description
    #[arg(long)]
    deep: bool,

    /// First listing page to fetch
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// CSV output path
    #[arg(long, value_name = "PATH", conflicts_with = "no_csv")]
    out_csv: Option<String>,

    /// Disable CSV output
    #[arg(long)]
    no_csv: bool,

    /// SQLite output path (no database is written unless set)
    #[arg(long, value_name = "PATH")]
    out_sqlite: Option<String>,

    /// Logging level
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_level);

    let config = build_config(&cli)?;
    let config_hash = compute_config_hash(&config);
    tracing::debug!("Effective configuration hash: {}", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    handle_crawl(config, &config_hash).await
}

/// Sets up the logging/tracing subscriber
///
/// `--quiet` wins over `--log-level`, which wins over `-v`.
fn setup_logging(verbose: u8, quiet: bool, level: Option<LogLevel>) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if let Some(level) = level {
        match level {
            LogLevel::Debug => EnvFilter::new("shelf_harvest=debug,info"),
            LogLevel::Info => EnvFilter::new("shelf_harvest=info,warn"),
            LogLevel::Warning => EnvFilter::new("warn"),
            LogLevel::Error => EnvFilter::new("error"),
        }
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_harvest=info,warn"),
            1 => EnvFilter::new("shelf_harvest=debug,info"),
            2 => EnvFilter::new("shelf_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file, then applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay = delay;
    }
    if cli.deep {
        config.crawler.deep = true;
    }
    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(csv) = &cli.out_csv {
        config.output.csv_path = Some(csv.clone());
    }
    if cli.no_csv {
        config.output.csv_path = None;
    }
    if let Some(sqlite) = &cli.out_sqlite {
        config.output.sqlite_path = Some(sqlite.clone());
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Shelf-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Delay: {}s", config.crawler.delay);
    println!("  Deep mode: {}", config.crawler.deep);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Backoff: {}ms doubling, capped at {}ms",
        config.fetch.backoff_base_ms, config.fetch.backoff_max_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  CSV: {}",
        config.output.csv_path.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "  SQLite: {}",
        config.output.sqlite_path.as_deref().unwrap_or("(disabled)")
    );

    println!("\n✓ Configuration is valid (hash: {})", &config_hash[..12]);
}

/// Renders progress events as log lines until the channel closes
async fn log_progress(mut events: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::PageParsed {
                page,
                items,
                has_next,
            } => {
                tracing::debug!("Page {}: {} items (next page: {})", page, items, has_next)
            }
            ProgressEvent::ItemEnriched {
                page,
                index,
                total,
                title,
            } => tracing::info!("Page {}: details {}/{} {}", page, index + 1, total, title),
            ProgressEvent::EnrichmentFailed { url, error, .. } => {
                tracing::debug!("Detail page {} failed: {}", url, error)
            }
            ProgressEvent::PageFailed { page, error, .. } => {
                tracing::debug!("Listing page {} failed: {}", page, error)
            }
            ProgressEvent::PageFetched { .. } | ProgressEvent::Finished { .. } => {}
        }
    }
}

/// Waits for the progress task, logging it if the task died
///
/// Returns `false` when the task panicked or was aborted.
async fn finish_progress(progress: JoinHandle<()>) -> bool {
    match progress.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Progress reporting stopped early: {}", e);
            false
        }
    }
}

fn build_sinks(config: &Config, config_hash: &str) -> anyhow::Result<Vec<(String, Box<dyn RecordSink>)>> {
    let mut sinks: Vec<(String, Box<dyn RecordSink>)> = Vec::new();

    if let Some(path) = &config.output.csv_path {
        sinks.push((path.clone(), Box::new(CsvSink::new(path))));
    }
    if let Some(path) = &config.output.sqlite_path {
        let sink = SqliteSink::open(Path::new(path), config_hash)
            .with_context(|| format!("failed to open database {}", path))?;
        sinks.push((path.clone(), Box::new(sink)));
    }

    Ok(sinks)
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut coordinator = Coordinator::new(&config, CancellationToken::new())?.with_events(tx);

    let ctrl_c = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with the pages scraped so far");
            ctrl_c.cancel();
        }
    });

    let progress = tokio::spawn(log_progress(rx));
    let result = coordinator.run().await;
    drop(coordinator);
    finish_progress(progress).await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if report.records.is_empty() {
        println!("No records were scraped. Check the start URL and your network connection.");
        print_run_summary(&report);
        return Ok(());
    }

    let mut sinks = build_sinks(&config, config_hash)?;
    for (label, sink) in sinks.iter_mut() {
        sink.write_records(&report)
            .with_context(|| format!("failed to write {} output to {}", sink.name(), label))?;
    }

    for (label, sink) in &sinks {
        match sink.sample(SAMPLE_SIZE) {
            Ok(rows) => print_sample(label, &rows),
            Err(e) => tracing::warn!("Could not read back {}: {}", label, e),
        }
    }
    print_run_summary(&report);

    if sinks.is_empty() {
        tracing::warn!("No outputs configured; {} records were discarded", report.records.len());
    } else {
        let columns = output::columns(report.deep).join(", ");
        tracing::info!("Columns: {}", columns);
    }

    Ok(())
}
