use crate::robots::RobotsPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Dino-Search
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub robots: RobotsConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL (the seed is depth 0)
    pub max_depth: u32,

    /// Hard timeout for every HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Fixed minimum time between requests to the same domain (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the random jitter added per request (milliseconds)
    pub max_delay_ms: u64,

    /// Maximum number of tasks in flight at once
    pub max_concurrent_fetches: u32,

    /// Scheme given to seeds that do not carry one
    pub default_scheme: String,

    /// Whether fetched pages are turned into records or only used for link discovery
    pub extract_content: bool,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            request_timeout_secs: 10,
            min_delay_ms: 0,
            max_delay_ms: 5000,
            max_concurrent_fetches: 8,
            default_scheme: "https".to_string(),
            extract_content: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also matched against robots.txt `User-agent` groups
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the full `User-Agent` header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesised part omitted when no contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = self
            .contact_url
            .iter()
            .map(|url| format!("+{}", url))
            .chain(self.contact_email.iter().cloned())
            .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DinoSearch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// Robots.txt compliance configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RobotsConfig {
    /// What to do when robots.txt cannot be fetched
    pub policy: RobotsPolicy,

    /// How long a fetched robots.txt stays valid (seconds); 0 caches for
    /// the lifetime of the process
    pub cache_ttl_secs: u64,
}

impl RobotsConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            policy: RobotsPolicy::FailOpen,
            cache_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Main-content detection and cleaning configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    /// Selectors tried in priority order to find main content
    pub content_selectors: Vec<String>,

    /// Selectors removed from every content match before taking its text
    pub noise_selectors: Vec<String>,

    /// Sentence fragments shorter than this are dropped while cleaning
    pub min_fragment_len: usize,

    /// Cap on keywords produced by the frequency fallback
    pub max_keywords: usize,

    /// Words never used as fallback keywords
    pub stop_words: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_selectors: to_strings(&[
                "article",
                "main",
                "[role='main']",
                ".content",
                "#content",
                ".post-content",
                ".entry-content",
                ".article",
                ".post",
                "section",
            ]),
            noise_selectors: to_strings(&[
                "header",
                "footer",
                "nav",
                ".header",
                ".footer",
                ".nav",
                ".sidebar",
                ".comments",
                ".menu",
                ".advertisement",
                ".ads",
                ".social-share",
                "style",
                "script",
                "noscript",
            ]),
            min_fragment_len: 30,
            max_keywords: 10,
            stop_words: to_strings(&[
                "the", "and", "or", "a", "an", "in", "to", "of", "for", "that", "this", "with",
                "from",
            ]),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "dino-search.db".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
