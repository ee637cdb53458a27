//! URL handling module for Dino-Search
//!
//! This module provides seed parsing, URL normalization for the visited set,
//! and domain/origin extraction for the politeness layers.

mod domain;
mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, origin_key};
pub use normalize::normalize_url;

/// Parses a user-supplied seed into an absolute HTTP(S) URL
///
/// The seed may omit its scheme (`example.com/docs`), in which case
/// `default_scheme` is applied. Any explicit scheme other than `http` or
/// `https` is rejected. No network access happens here.
///
/// # Arguments
///
/// * `input` - The raw seed or query string
/// * `default_scheme` - Scheme for seeds that lack one (`"https"` by default)
///
/// # Returns
///
/// * `Ok(Url)` - The absolute seed URL
/// * `Err(UrlError)` - The input is empty, not URL-like, or uses another scheme
///
/// # Examples
///
/// ```
/// use dino_search::url::parse_seed;
///
/// let url = parse_seed("example.com", "https").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
///
/// assert!(parse_seed("ftp://example.com", "https").is_err());
/// ```
pub fn parse_seed(input: &str, default_scheme: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    if input.chars().any(char::is_whitespace) {
        return Err(UrlError::NotAUrl(input.to_string()));
    }

    let candidate = match explicit_scheme(input) {
        Some(scheme) if is_http_scheme(scheme) => input.to_string(),
        Some(scheme) => return Err(UrlError::InvalidScheme(scheme.to_string())),
        None => format!("{}://{}", default_scheme, input),
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_http_scheme(url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Returns true for the only schemes the crawler will fetch
pub fn is_http_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

/// Finds a scheme the user actually typed
///
/// `host:port` inputs such as `localhost:8080` or `127.0.0.1:3000` would parse
/// as a scheme on their own, so a colon followed by a digit, or a "scheme"
/// containing a dot, is treated as an authority instead.
fn explicit_scheme(input: &str) -> Option<&str> {
    if let Some((scheme, _)) = input.split_once("://") {
        return Some(scheme);
    }

    let (scheme, rest) = input.split_once(':')?;
    let starts_alpha = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-');
    let looks_like_port = rest.chars().next().is_some_and(|c| c.is_ascii_digit());

    (starts_alpha && valid_chars && !looks_like_port).then_some(scheme)
}
