use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The domain is the key for per-domain rate limiting.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use dino_search::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the origin of a URL as `scheme://host[:port]`
///
/// robots.txt rules apply per origin, so the robots cache is keyed by this
/// value rather than by host alone. Default ports are omitted.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use dino_search::url::origin_key;
///
/// let url = Url::parse("http://example.com:8080/a").unwrap();
/// assert_eq!(origin_key(&url), Some("http://example.com:8080".to_string()));
/// ```
pub fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
