//! Dino-Search: a polite, depth-bounded crawler with a content-extraction pipeline
//!
//! This crate crawls outward from a single seed URL, respecting robots.txt and
//! per-domain politeness delays, and turns every fetched HTML page into a
//! [`SearchableContent`] record handed to a storage collaborator.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Dino-Search operations
///
/// Only input and storage failures abort a crawl. Fetch and extraction
/// failures are scoped to a single task and are reported through
/// [`crawler::CrawlReport`] instead.
#[derive(Debug, Error)]
pub enum DinoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Input(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] extract::ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),
}

/// URL and seed input errors
///
/// These are raised before any network access happens.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Empty input")]
    Empty,

    #[error("Not a URL: '{0}' (search queries are not supported)")]
    NotAUrl(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Dino-Search operations
pub type Result<T> = std::result::Result<T, DinoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlReport, CrawlTask};
pub use extract::{ContentExtractor, SearchableContent};
pub use robots::{RobotsCache, RobotsPolicy};
pub use state::{DomainThrottleState, TaskOutcome};
pub use storage::{ContentSink, MemoryStorage, SqliteStorage};
pub use url::{normalize_url, parse_seed};
