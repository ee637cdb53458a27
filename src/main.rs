//! Dino-Search main entry point
//!
//! This is the command-line interface for the Dino-Search crawler.

use anyhow::Context;
use clap::Parser;
use dino_search::config::{load_config_with_hash, Config};
use dino_search::storage::{RunStatus, SqliteStorage};
use dino_search::CrawlEngine;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Dino-Search: a polite, depth-bounded crawler
///
/// Crawls outward from a URL while respecting robots.txt and per-domain
/// delays, and stores the title, cleaned text, headings and keywords of
/// every page it fetches.
#[derive(Parser, Debug)]
#[command(name = "dino-search")]
#[command(version)]
#[command(about = "A polite crawler with a content-extraction pipeline", long_about = None)]
struct Cli {
    /// URL to crawl (the scheme may be omitted)
    #[arg(value_name = "QUERY")]
    query: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the maximum crawl depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Only discover links; do not extract or store page content
    #[arg(long)]
    no_extract: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            (Config::default(), "default".to_string())
        }
    };

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if cli.no_extract {
        config.crawler.extract_content = false;
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.query);
        return Ok(());
    }

    handle_crawl(config, &config_hash, &cli.query).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dino_search=info,warn"),
            1 => EnvFilter::new("dino_search=debug,info"),
            2 => EnvFilter::new("dino_search=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, query: &str) {
    println!("=== Dino-Search Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Per-domain delay: {}ms + up to {}ms jitter",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Extract content: {}", config.crawler.extract_content);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Robots policy: {:?}", config.robots.policy);
    println!("Database: {}", config.output.database_path);

    match dino_search::parse_seed(query, &config.crawler.default_scheme) {
        Ok(seed) => println!("\n✓ Would start crawling from {}", seed),
        Err(e) => println!("\n✗ Query would be rejected: {}", e),
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, query: &str) -> anyhow::Result<()> {
    // Reject bad input before touching the database or the network
    let seed = dino_search::parse_seed(query, &config.crawler.default_scheme)
        .with_context(|| format!("Cannot crawl '{}'", query))?;

    let database_path = config.output.database_path.clone();
    let mut storage = SqliteStorage::new(Path::new(&database_path))
        .with_context(|| format!("Failed to open database {}", database_path))?;

    let cancel = CancellationToken::new();
    let engine = CrawlEngine::with_cancellation(config, cancel.clone())?;

    // Stop dispatching new tasks on Ctrl-C; in-flight fetches finish on their own.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            cancel.cancel();
        }
    });

    let run_id = storage.begin_run(seed.as_str(), config_hash)?;

    match engine.crawl(seed.as_str(), &mut storage).await {
        Ok(report) => {
            let status = if report.cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            };
            storage.finish_run(run_id, status)?;
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            storage.finish_run(run_id, RunStatus::Failed)?;
            Err(e.into())
        }
    }
}
