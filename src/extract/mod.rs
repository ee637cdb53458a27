//! Content extraction pipeline
//!
//! This module turns fetched HTML into [`SearchableContent`] records:
//! - Title and `meta[name=keywords]` lookup
//! - h1–h3 headings in document order
//! - Main-content detection with noise removal
//! - Sentence-fragment cleaning and a keyword fallback heuristic

mod clean;
mod content;

pub use clean::{clean_text, extract_keywords, split_meta_keywords};
pub use content::ContentExtractor;

use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting content from a page
///
/// An extraction error abandons the record for that page only; links found
/// on the page are still followed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Document has no extractable content")]
    EmptyDocument,

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),
}

/// The structured output record of the extraction pipeline
///
/// Ownership passes to the storage collaborator as soon as it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchableContent {
    /// Source URL (after redirects)
    pub url: Url,

    /// Text of the first `<title>` element, empty when absent
    pub title: String,

    /// Cleaned main-content text
    pub text: String,

    /// Heading texts (levels 1–3) in document order
    pub headings: Vec<String>,

    /// Deduplicated keywords in first-seen order
    pub keywords: Vec<String>,
}
