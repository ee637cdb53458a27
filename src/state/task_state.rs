/// Task outcome definitions for tracking crawl progress
///
/// Every dequeued [`CrawlTask`](crate::crawler::CrawlTask) ends in exactly one of these outcomes.
use std::fmt;

/// Represents how a single crawl task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    // ===== Success =====
    /// Page was fetched, its links were followed and (when enabled) a record was emitted
    Processed,

    /// The server answered with a redirect; the target was offered to the frontier
    Redirected,

    // ===== Partial =====
    /// Page was fetched and its links were followed, but no record could be produced
    ExtractionFailed,

    // ===== Skips =====
    /// robots.txt refused the URL; no request was made
    Disallowed,

    /// The crawl was cancelled before the request was dispatched
    Cancelled,

    // ===== Errors =====
    /// Timeout, transport error, non-success status, non-HTML response or
    /// a redirect chain longer than the limit
    FetchFailed,
}

impl TaskOutcome {
    /// Returns true if the page body was retrieved
    pub fn was_fetched(&self) -> bool {
        matches!(self, Self::Processed | Self::ExtractionFailed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true if this represents a skip (no request was attempted)
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Disallowed | Self::Cancelled)
    }

    /// Returns true if this represents an error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::ExtractionFailed)
    }

    /// Stable lowercase name, used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Redirected => "redirected",
            Self::ExtractionFailed => "extraction_failed",
            Self::Disallowed => "disallowed",
            Self::Cancelled => "cancelled",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
