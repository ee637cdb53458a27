//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.
//!
//! When robots.txt cannot be retrieved the outcome is decided by [`RobotsPolicy`].
//! The default, [`RobotsPolicy::FailOpen`], treats the origin as fully allowed; this
//! is a permissive default, not a strict compliance guarantee.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{robots_token, ParsedRobots};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while retrieving robots.txt
///
/// These never escape [`RobotsCache`]; they are resolved by the configured policy.
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("robots.txt request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("robots.txt returned HTTP {0}")]
    Status(u16),
}

/// What to do when robots.txt cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsPolicy {
    /// Treat the origin as allowed
    #[default]
    FailOpen,
    /// Treat the origin as disallowed
    FailClosed,
}

impl RobotsPolicy {
    /// The rule set used in place of an unreachable robots.txt
    pub fn fallback(&self) -> ParsedRobots {
        match self {
            Self::FailOpen => ParsedRobots::allow_all(),
            Self::FailClosed => ParsedRobots::disallow_all(),
        }
    }
}

/// Fetches and parses robots.txt
///
/// # Status handling
///
/// | Response | Result |
/// |----------|--------|
/// | 2xx | parsed body |
/// | 4xx | allow all (no robots.txt) |
/// | 5xx | `Err(RobotsError::Status)` |
/// | transport error / timeout | `Err(RobotsError::Transport)` |
///
/// # Arguments
///
/// * `client` - The HTTP client (carries the user agent and timeout)
/// * `robots_url` - The absolute robots.txt URL
pub async fn fetch_robots(client: &Client, robots_url: &str) -> Result<ParsedRobots, RobotsError> {
    let response = client.get(robots_url).send().await?;
    let status = response.status();

    if status.is_client_error() {
        tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status.as_u16());
        return Ok(ParsedRobots::allow_all());
    }

    if !status.is_success() {
        return Err(RobotsError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(ParsedRobots::from_content(&body))
}
