//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The crawl frontier and visited set
//! - Per-domain rate limiting
//! - HTTP fetching with timeout and manual redirect handling
//! - Link extraction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod rate_limiter;
mod report;

pub use coordinator::CrawlEngine;
pub use fetcher::{
    build_http_client, is_html_content_type, FetchError, FetchResponse, FetchedPage, Fetcher,
    MAX_REDIRECTS,
};
pub use frontier::{visit_key, CrawlTask, Frontier, Offer, VisitedSet};
pub use parser::{resolve_link, LinkExtractor};
pub use rate_limiter::RateLimiter;
pub use report::CrawlReport;
