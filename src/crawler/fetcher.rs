//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests with a hard per-request timeout
//! - Manual redirect handling: a 3xx response is reported back as a new URL
//! - Error classification
//!
//! There are no retries: a failed fetch abandons only its own task.
//! Redirects are never followed by the client, so every hop goes back
//! through the frontier and gets its own robots.txt and visited checks.

use crate::config::Config;
use reqwest::{
    header::{CONTENT_TYPE, LOCATION},
    redirect::Policy,
    Client,
};
use thiserror::Error;
use url::Url;

/// Maximum length of a redirect chain started by one crawl task
pub const MAX_REDIRECTS: u32 = 10;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Expected HTML, got '{0}'")]
    NotHtml(String),

    #[error("HTTP {0} without a usable Location header")]
    BadRedirect(u16),

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    fn classify(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error)
        } else {
            Self::Transport(error)
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value (empty when absent)
    pub content_type: String,

    /// Page body content
    pub body: String,
}

/// What a single GET produced
#[derive(Debug, Clone)]
pub enum FetchResponse {
    /// An HTML page with a 2xx status
    Page(FetchedPage),

    /// A 3xx response; the absolute target URL (fragment removed)
    Redirect(Url),
}

/// Builds the HTTP client shared by page and robots.txt requests
///
/// The user agent is formatted as `Name/Version (+ContactURL; ContactEmail)`.
///
/// # Example
///
/// ```no_run
/// use dino_search::config::Config;
/// use dino_search::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .redirect(Policy::none()) // Redirects are re-queued by the engine
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type header denotes an HTML document
///
/// A missing header is given the benefit of the doubt.
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.trim().is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

/// Issues GET requests for crawl tasks
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL
    ///
    /// # Error classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Timeout (connect, headers or body) | `FetchError::Timeout` |
    /// | Connection refused / DNS / TLS | `FetchError::Connect` |
    /// | 3xx with a valid http(s) Location | `FetchResponse::Redirect` |
    /// | 3xx with missing or unusable Location | `FetchError::BadRedirect` |
    /// | Other non-2xx | `FetchError::Status` |
    /// | Content-Type is not HTML | `FetchError::NotHtml` |
    /// | Other errors | `FetchError::Transport` |
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::classify)?;

        let status = response.status();

        if status.is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| redirect_target(url, location))
                .ok_or(FetchError::BadRedirect(status.as_u16()))?;
            tracing::debug!("{} redirects to {}", url, target);
            return Ok(FetchResponse::Redirect(target));
        }

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(FetchError::NotHtml(content_type));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e)
            }
        })?;

        Ok(FetchResponse::Page(FetchedPage {
            url: url.clone(),
            status_code: status.as_u16(),
            content_type,
            body,
        }))
    }
}

/// Resolves a Location header against the request URL
///
/// Returns `None` for unparseable or non-http(s) targets.
fn redirect_target(base: &Url, location: &str) -> Option<Url> {
    let mut target = base.join(location.trim()).ok()?;
    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }
    target.set_fragment(None);
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(timeout_secs: u64) -> Fetcher {
        let mut config = Config::default();
        config.crawler.request_timeout_secs = timeout_secs;
        config.user_agent.crawler_name = "TestCrawler".to_string();
        config.user_agent.crawler_version = "1.0".to_string();
        Fetcher::new(build_http_client(&config).unwrap())
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body, "text/html")
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&Config::default()).is_ok());
    }

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("Text/HTML; charset=UTF-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(is_html_content_type(""));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("image/png"));
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", "TestCrawler/1.0"))
            .respond_with(html("<html><body>Hello</body></html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let response = test_fetcher(5).fetch(&url).await.unwrap();

        let FetchResponse::Page(page) = response else {
            panic!("expected a page, got {:?}", response);
        };
        assert_eq!(page.status_code, 200);
        assert!(page.content_type.starts_with("text/html"));
        assert!(page.body.contains("Hello"));
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn test_fetch_reports_redirect_without_following() {
        let server = MockServer::start().await;
        let location = format!("{}/new#top", server.uri());
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html("<html><body>Moved</body></html>"))
            .expect(0)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let response = test_fetcher(5).fetch(&url).await.unwrap();

        match response {
            FetchResponse::Redirect(target) => {
                assert_eq!(target.path(), "/new");
                assert_eq!(target.fragment(), None);
            }
            other => panic!("expected a redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_relative_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "../moved"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/docs/old", server.uri())).unwrap();
        let response = test_fetcher(5).fetch(&url).await.unwrap();

        assert!(matches!(response, FetchResponse::Redirect(target) if target.path() == "/moved"));
    }

    #[tokio::test]
    async fn test_fetch_redirect_without_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nowhere"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/nowhere", server.uri())).unwrap();
        let result = test_fetcher(5).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::BadRedirect(302))));
    }

    #[test]
    fn test_redirect_target() {
        let base = Url::parse("https://example.com/a/b").unwrap();

        assert_eq!(
            redirect_target(&base, "/c").unwrap().as_str(),
            "https://example.com/c"
        );
        assert_eq!(
            redirect_target(&base, "https://other.com/x#frag").unwrap().as_str(),
            "https://other.com/x"
        );
        assert!(redirect_target(&base, "ftp://example.com/file").is_none());
        assert!(redirect_target(&base, "mailto:someone@example.com").is_none());
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = test_fetcher(5).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_fetch_not_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/file.pdf", server.uri())).unwrap();
        let result = test_fetcher(5).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::NotHtml(ct)) if ct == "application/pdf"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(html("<html></html>").set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let result = test_fetcher(1).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let result = test_fetcher(5).fetch(&url).await;

        assert!(matches!(
            result,
            Err(FetchError::Connect(_)) | Err(FetchError::Transport(_))
        ));
    }
}
