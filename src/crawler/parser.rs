//! Link discovery
//!
//! [`LinkExtractor`] walks the anchors of a parsed page and resolves their
//! targets against the page URL.

use scraper::{Html, Selector};
use url::Url;

/// Discovers outbound hyperlinks in a parsed HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - Empty hrefs and fragment-only (same page) anchors
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Hrefs that fail to resolve against the page URL
/// - Non-HTTP(S) URLs after resolution
///
/// Fragments are stripped from every result and duplicates removed,
/// keeping first-seen order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts absolute links from a parsed document
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `base_url` - The URL the page was served from (after redirects)
    pub fn extract(&self, document: &Html, base_url: &Url) -> Vec<Url> {
        let mut links: Vec<Url> = Vec::new();

        let Ok(a_selector) = Selector::parse("a[href]") else {
            return links;
        };

        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if !links.contains(&absolute_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }

        links
    }

    /// Convenience wrapper that parses `html` first
    pub fn extract_from_str(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        self.extract(&document, base_url)
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.host_str()?;

    absolute_url.set_fragment(None);
    Some(absolute_url)
}
