//! Crawler coordinator - main crawl orchestration logic
//!
//! [`CrawlEngine`] owns the long-lived shared state (robots.txt cache,
//! per-domain throttles, HTTP client). Each call to [`CrawlEngine::crawl`]
//! creates a fresh frontier and visited set, then runs a dispatch loop:
//! - Dequeue tasks and spawn them, up to `max-concurrent-fetches` in flight
//! - Each task checks robots.txt, waits for its domain slot and fetches
//! - Finished tasks report back their links, redirect target and record
//! - The loop grows the frontier and hands records to the sink
//!
//! A redirect target is queued like a discovered link at the same depth, so
//! it is fetched at most once and is subject to robots.txt like any other URL.
//!
//! Only the loop touches the frontier, so it needs no locking.

use crate::config::Config;
use crate::crawler::fetcher::{
    build_http_client, FetchResponse, FetchedPage, Fetcher, MAX_REDIRECTS,
};
use crate::crawler::frontier::{CrawlTask, Frontier, Offer};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::report::CrawlReport;
use crate::extract::{ContentExtractor, ExtractError, SearchableContent};
use crate::robots::RobotsCache;
use crate::state::TaskOutcome;
use crate::storage::ContentSink;
use crate::url::{extract_domain, parse_seed};
use crate::DinoError;
use scraper::Html;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared per-task collaborators
struct TaskContext {
    fetcher: Fetcher,
    robots: RobotsCache,
    limiter: RateLimiter,
    links: LinkExtractor,
    extractor: Option<ContentExtractor>,
    user_agent: String,
    cancel: CancellationToken,
}

/// What a finished task reports back to the dispatch loop
struct TaskResult {
    task: CrawlTask,
    outcome: TaskOutcome,
    links: Vec<Url>,
    redirect: Option<Url>,
    content: Option<SearchableContent>,
}

impl TaskResult {
    fn skipped(task: CrawlTask, outcome: TaskOutcome) -> Self {
        Self {
            task,
            outcome,
            links: Vec::new(),
            redirect: None,
            content: None,
        }
    }

    fn redirected(task: CrawlTask, target: Url) -> Self {
        Self {
            redirect: Some(target),
            ..Self::skipped(task, TaskOutcome::Redirected)
        }
    }
}

impl TaskContext {
    /// Runs one task from robots.txt check to extraction
    async fn process(&self, task: CrawlTask) -> TaskResult {
        if !self.robots.allows(&task.url, &self.user_agent).await {
            tracing::info!("Skipping {}: disallowed by robots.txt", task.url);
            return TaskResult::skipped(task, TaskOutcome::Disallowed);
        }

        let domain = extract_domain(&task.url).unwrap_or_default();
        tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Abandoning {}: crawl cancelled", task.url);
                return TaskResult::skipped(task, TaskOutcome::Cancelled);
            }
            _ = self.limiter.wait(&domain) => {}
        }

        tracing::info!("Visiting {} (depth {})", task.url, task.depth);

        match self.fetcher.fetch(&task.url).await {
            Ok(FetchResponse::Page(page)) => self.analyze(task, page),
            Ok(FetchResponse::Redirect(_)) if task.redirects >= MAX_REDIRECTS => {
                tracing::warn!(
                    "Failed to fetch {}: more than {} redirects",
                    task.url,
                    MAX_REDIRECTS
                );
                TaskResult::skipped(task, TaskOutcome::FetchFailed)
            }
            Ok(FetchResponse::Redirect(target)) => TaskResult::redirected(task, target),
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", task.url, e);
                TaskResult::skipped(task, TaskOutcome::FetchFailed)
            }
        }
    }

    /// Parses the page once and runs link discovery and extraction over it
    ///
    /// Synchronous: the parsed document must not live across an await.
    fn analyze(&self, task: CrawlTask, page: FetchedPage) -> TaskResult {
        let document = Html::parse_document(&page.body);

        let links = self.links.extract(&document, &page.url);
        tracing::debug!("Found {} links on {}", links.len(), page.url);

        let (outcome, content) = match &self.extractor {
            None => (TaskOutcome::Processed, None),
            Some(_) if page.body.trim().is_empty() => {
                tracing::warn!(
                    "Failed to extract content from {}: {}",
                    page.url,
                    ExtractError::EmptyDocument
                );
                (TaskOutcome::ExtractionFailed, None)
            }
            Some(extractor) => (
                TaskOutcome::Processed,
                Some(extractor.extract_document(&page.url, &document)),
            ),
        };

        TaskResult {
            task,
            outcome,
            links,
            redirect: None,
            content,
        }
    }
}

/// Polite, depth-bounded crawler
///
/// Robots.txt rules and domain throttles persist across crawls made with the
/// same engine; the frontier and visited set are scoped to a single crawl.
///
/// # Example
///
/// ```no_run
/// use dino_search::{Config, CrawlEngine, MemoryStorage};
///
/// # async fn run() -> dino_search::Result<()> {
/// let engine = CrawlEngine::new(Config::default())?;
/// let mut storage = MemoryStorage::new();
/// let report = engine.crawl("example.com", &mut storage).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct CrawlEngine {
    config: Arc<Config>,
    context: Arc<TaskContext>,
}

impl CrawlEngine {
    /// Creates an engine with its own cancellation token
    pub fn new(config: Config) -> Result<Self, DinoError> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Creates an engine that stops dispatching when `cancel` fires
    pub fn with_cancellation(config: Config, cancel: CancellationToken) -> Result<Self, DinoError> {
        let client = build_http_client(&config)?;
        let extractor = if config.crawler.extract_content {
            Some(ContentExtractor::new(&config.extraction)?)
        } else {
            None
        };

        let context = TaskContext {
            robots: RobotsCache::new(
                client.clone(),
                config.robots.policy,
                config.robots.cache_ttl(),
            ),
            fetcher: Fetcher::new(client),
            limiter: RateLimiter::from_config(&config.crawler),
            links: LinkExtractor::new(),
            extractor,
            user_agent: config.user_agent.header_value(),
            cancel,
        };

        Ok(Self {
            config: Arc::new(config),
            context: Arc::new(context),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that cancels crawls made with this engine
    pub fn cancellation_token(&self) -> CancellationToken {
        self.context.cancel.clone()
    }

    /// The engine's robots.txt cache
    pub fn robots(&self) -> &RobotsCache {
        &self.context.robots
    }

    /// The engine's per-domain rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.context.limiter
    }

    /// Crawls from `seed` up to the configured maximum depth
    pub async fn crawl(
        &self,
        seed: &str,
        sink: &mut dyn ContentSink,
    ) -> Result<CrawlReport, DinoError> {
        self.crawl_with_depth(seed, self.config.crawler.max_depth, sink)
            .await
    }

    /// Crawls from `seed`, following links at most `max_depth` hops away
    ///
    /// The seed may omit its scheme, in which case the configured default
    /// scheme is used. There is no page-count cap: `max_depth` is the only bound.
    ///
    /// # Errors
    ///
    /// * `DinoError::Input` - the seed is not a valid http(s) URL (no I/O happens)
    /// * `DinoError::Storage` - the sink rejected a record
    ///
    /// Per-task failures are logged and counted in the returned [`CrawlReport`].
    pub async fn crawl_with_depth(
        &self,
        seed: &str,
        max_depth: u32,
        sink: &mut dyn ContentSink,
    ) -> Result<CrawlReport, DinoError> {
        let mut seed_url = parse_seed(seed, &self.config.crawler.default_scheme)?;
        seed_url.set_fragment(None);

        tracing::info!("Starting crawl from {} (max depth {})", seed_url, max_depth);
        let start_time = Instant::now();

        let mut report = CrawlReport::new(seed_url.clone(), max_depth);
        let mut frontier = Frontier::new(max_depth);
        report.record_offer(0, frontier.offer(CrawlTask::root(seed_url)));

        let max_in_flight = self.config.crawler.max_concurrent_fetches.max(1) as usize;
        let mut in_flight: JoinSet<TaskResult> = JoinSet::new();

        loop {
            if !self.context.cancel.is_cancelled() {
                while in_flight.len() < max_in_flight {
                    let Some(task) = frontier.next() else {
                        break;
                    };
                    let context = Arc::clone(&self.context);
                    in_flight.spawn(async move { context.process(task).await });
                }
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok(result) => self.handle_result(result, &mut frontier, &mut report, sink)?,
                Err(e) => tracing::error!("Crawl task failed: {}", e),
            }
        }

        report.unvisited = frontier.len();
        report.cancelled = self.context.cancel.is_cancelled();
        report.elapsed = start_time.elapsed();

        if report.cancelled {
            tracing::info!(
                "Crawl cancelled: {} pages fetched, {} tasks unvisited",
                report.pages_fetched,
                report.unvisited
            );
        } else {
            tracing::info!(
                "Crawl completed: {} pages fetched, {} records in {:?}",
                report.pages_fetched,
                report.records_emitted,
                report.elapsed
            );
        }

        Ok(report)
    }

    /// Applies a finished task to the frontier, report and sink
    fn handle_result(
        &self,
        result: TaskResult,
        frontier: &mut Frontier,
        report: &mut CrawlReport,
        sink: &mut dyn ContentSink,
    ) -> Result<(), DinoError> {
        report.record_outcome(result.outcome);

        if let Some(target) = result.redirect {
            let offer = frontier.offer(result.task.redirect(target));
            if offer == Offer::Duplicate {
                tracing::debug!(
                    "Not following redirect from {}: target already seen",
                    result.task.url
                );
            }
            report.record_offer(result.task.depth, offer);
        }

        let child_depth = result.task.depth + 1;
        for link in result.links {
            let offer = frontier.offer(result.task.child(link));
            report.record_offer(child_depth, offer);
        }

        if let Some(content) = result.content {
            sink.store(content)?;
            report.records_emitted += 1;
        }

        Ok(())
    }
}
