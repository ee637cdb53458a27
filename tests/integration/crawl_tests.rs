//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use dino_search::config::Config;
use dino_search::storage::{ContentSink, MemoryStorage, SqliteStorage};
use dino_search::{
    CrawlEngine, DinoError, RobotsPolicy, SearchableContent, TaskOutcome, UrlError,
};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_TEXT: &str =
    "Dinosaurs dominated terrestrial ecosystems for over one hundred and sixty million years";

/// Creates a test configuration: plain http seeds, no politeness delay
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.default_scheme = "http".to_string();
    config.crawler.min_delay_ms = 0;
    config.crawler.max_delay_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config.crawler.max_concurrent_fetches = 4;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}

fn html_page(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    let location = format!("{}{}", server.uri(), to);
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("location", location.as_str()))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn links_page(title: &str, hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, anchors
    )
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let index = format!(
        r#"<html><head><title>Home</title></head><body>
        <nav><a href="/page1">Page 1</a></nav>
        <h2>Fossils</h2>
        <article>
            <p>{}.</p>
            <a href="{}/page2">Page 2</a>
        </article>
        </body></html>"#,
        ARTICLE_TEXT, base_url
    );
    mount_page(&mock_server, "/", index, 1).await;
    mount_page(&mock_server, "/page1", links_page("Page 1", &["/page3"]), 1).await;
    mount_page(&mock_server, "/page2", links_page("Page 2", &[]), 1).await;
    mount_page(&mock_server, "/page3", links_page("Page 3", &["/page4"]), 1).await;
    mount_page(&mock_server, "/page4", links_page("Page 4", &[]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&base_url, &mut storage).await.unwrap();

    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.records_emitted, 4);
    assert_eq!(report.enqueued_at(0), 1);
    assert_eq!(report.enqueued_at(1), 2);
    assert_eq!(report.enqueued_at(2), 1);
    assert_eq!(report.too_deep_skipped, 1);

    let home = storage
        .records()
        .iter()
        .find(|record| record.url.path() == "/")
        .expect("home page record");
    assert_eq!(home.title, "Home");
    assert_eq!(home.text, ARTICLE_TEXT);
    assert_eq!(home.headings, vec!["Fossils"]);
    assert_eq!(
        home.keywords,
        vec![
            "dinosaurs",
            "dominated",
            "terrestrial",
            "ecosystems",
            "over",
            "hundred",
            "sixty",
            "million",
            "years"
        ]
    );
}

#[tokio::test]
async fn test_robots_disallow_is_never_fetched() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private").await;
    mount_page(
        &mock_server,
        "/",
        links_page("Home", &["/private/page", "/public"]),
        1,
    )
    .await;
    mount_page(&mock_server, "/public", links_page("Public", &[]), 1).await;
    mount_page(&mock_server, "/private/page", links_page("Secret", &[]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.robots_disallowed(), 1);
    assert_eq!(report.pages_fetched, 2);
    assert!(storage
        .records()
        .iter()
        .all(|record| !record.url.path().starts_with("/private")));
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_never_fetched() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private").await;
    mount_page(&mock_server, "/", links_page("Home", &["/go"]), 1).await;
    mount_redirect(&mock_server, "/go", "/private/page").await;
    mount_page(&mock_server, "/private/page", links_page("Secret", &[]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.robots_disallowed(), 1);
    assert_eq!(report.count(TaskOutcome::Redirected), 1);
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_redirect_target_also_linked_is_fetched_once() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Home", &["/a", "/b"]), 1).await;
    mount_redirect(&mock_server, "/a", "/b").await;
    mount_page(&mock_server, "/b", links_page("B", &[]), 1).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    let mut paths: Vec<&str> = storage.records().iter().map(|r| r.url.path()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/", "/b"]);
}

#[tokio::test]
async fn test_robots_group_for_agent_token() {
    let mock_server = MockServer::start().await;

    mount_robots(
        &mock_server,
        "User-agent: TestBot\nDisallow: /bots-keep-out\n\nUser-agent: *\nAllow: /",
    )
    .await;
    mount_page(&mock_server, "/", links_page("Home", &["/bots-keep-out"]), 1).await;
    mount_page(&mock_server, "/bots-keep-out", links_page("No", &[]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.robots_disallowed(), 1);
}

#[tokio::test]
async fn test_robots_transport_error_fails_open() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", links_page("Home", &[]), 1).await;

    let mut config = create_test_config();
    config.crawler.request_timeout_secs = 1;
    let engine = CrawlEngine::new(config).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.robots_disallowed(), 0);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_robots_server_error_fail_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", links_page("Home", &[]), 0).await;

    let mut config = create_test_config();
    config.robots.policy = RobotsPolicy::FailClosed;
    let engine = CrawlEngine::new(config).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.robots_disallowed(), 1);
    assert_eq!(report.pages_fetched, 0);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_robots_fetched_once_per_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", links_page("Home", &["/a", "/b", "/c"]), 1).await;
    for page in ["/a", "/b", "/c"] {
        mount_page(&mock_server, page, links_page(page, &[]), 1).await;
    }

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(engine.robots().len().await, 1);
}

#[tokio::test]
async fn test_depth_bound_respected() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Root", &["/a"]), 1).await;
    mount_page(&mock_server, "/a", links_page("A", &["/b"]), 1).await;
    mount_page(&mock_server, "/b", links_page("B", &["/c"]), 1).await;
    mount_page(&mock_server, "/c", links_page("C", &["/d"]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine
        .crawl_with_depth(&mock_server.uri(), 2, &mut storage)
        .await
        .unwrap();

    assert_eq!(report.max_depth, 2);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.too_deep_skipped, 1);
    assert_eq!(report.enqueued_at(3), 0);
}

#[tokio::test]
async fn test_zero_depth_fetches_only_seed() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Root", &["/a"]), 1).await;
    mount_page(&mock_server, "/a", links_page("A", &[]), 0).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine
        .crawl_with_depth(&mock_server.uri(), 0, &mut storage)
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.too_deep_skipped, 1);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Root", &["/a", "/b", "/"]), 1).await;
    mount_page(
        &mock_server,
        "/a",
        links_page("A", &["/shared", "/shared#part", "/b/"]),
        1,
    )
    .await;
    mount_page(&mock_server, "/b", links_page("B", &["/shared?utm_source=b", "/a"]), 1).await;
    mount_page(&mock_server, "/shared", links_page("Shared", &["/"]), 1).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.pages_fetched, 4);
    assert!(report.duplicates_skipped >= 3);
}

#[tokio::test]
async fn test_seed_without_scheme_end_to_end() {
    let mock_server = MockServer::start().await;
    let address = mock_server.address();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Seed</title></head><body>
            <a href="/one">One</a>
            <a href="http://{}/two">Two</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
            address
        ),
        1,
    )
    .await;
    // Depth-1 pages are fetched but missing, so only the seed yields a record.
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine
        .crawl_with_depth(&format!("127.0.0.1:{}", address.port()), 1, &mut storage)
        .await
        .unwrap();

    assert_eq!(report.seed.scheme(), "http");
    assert_eq!(report.enqueued_at(1), 2);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(storage.records()[0].title, "Seed");
    assert_eq!(storage.records()[0].url.path(), "/");
    assert_eq!(report.count(TaskOutcome::FetchFailed), 2);
}

#[tokio::test]
async fn test_non_http_seed_rejected() {
    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = MemoryStorage::new();

    for seed in ["mailto:someone@example.com", "ftp://example.com/", "javascript:alert(1)"] {
        let result = engine.crawl(seed, &mut storage).await;
        assert!(
            matches!(result, Err(DinoError::Input(UrlError::InvalidScheme(_)))),
            "{} should be rejected",
            seed
        );
    }

    let result = engine.crawl("dinosaur facts", &mut storage).await;
    assert!(matches!(result, Err(DinoError::Input(UrlError::NotAUrl(_)))));
}

#[tokio::test]
async fn test_rate_limit_spaces_same_domain_requests() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Root", &["/a"]), 1).await;
    mount_page(&mock_server, "/a", links_page("A", &[]), 1).await;

    let mut config = create_test_config();
    config.crawler.min_delay_ms = 300;
    let engine = CrawlEngine::new(config).unwrap();
    let mut storage = MemoryStorage::new();

    let start = Instant::now();
    engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(engine.rate_limiter().request_count("127.0.0.1"), 2);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", links_page("Root", &[]), 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let engine = CrawlEngine::with_cancellation(create_test_config(), cancel).unwrap();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.unvisited, 1);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_cancel_keeps_records_and_abandons_waiting_tasks() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", links_page("Root", &["/a"]), 1).await;
    mount_page(&mock_server, "/a", links_page("A", &[]), 0).await;

    let mut config = create_test_config();
    config.crawler.min_delay_ms = 10_000;
    let cancel = CancellationToken::new();
    let engine = CrawlEngine::with_cancellation(config, cancel.clone()).unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let start = Instant::now();
    let mut storage = MemoryStorage::new();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(report.cancelled);
    assert_eq!(report.count(TaskOutcome::Cancelled), 1);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(storage.records()[0].title, "Root");
}

#[tokio::test]
async fn test_crawl_into_sqlite() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_page(&mock_server, "/", links_page("Root", &["/a"]), 1).await;
    mount_page(&mock_server, "/a", links_page("A", &[]), 1).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let report = engine.crawl(&mock_server.uri(), &mut storage).await.unwrap();

    assert_eq!(report.records_emitted, 2);
    assert_eq!(storage.count_pages().unwrap(), 2);

    let page = storage
        .get_page(&format!("{}/a", mock_server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(page.title, "A");
    assert_eq!(page.headings, vec!["A"]);
}

#[tokio::test]
async fn test_channel_sink_receives_records() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", links_page("Root", &[]), 1).await;

    let engine = CrawlEngine::new(create_test_config()).unwrap();
    let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SearchableContent>();
    let report = engine
        .crawl(&mock_server.uri(), &mut tx as &mut dyn ContentSink)
        .await
        .unwrap();

    assert_eq!(report.records_emitted, 1);
    assert_eq!(rx.recv().await.unwrap().title, "Root");
}
