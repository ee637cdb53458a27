//! Per-run crawl summary

use crate::crawler::frontier::Offer;
use crate::state::TaskOutcome;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Counters collected while a crawl runs, returned when it ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// The seed after scheme defaulting
    pub seed: Url,

    /// Maximum depth used for this run
    pub max_depth: u32,

    /// Tasks queued, by depth (the seed is the single depth-0 task)
    pub enqueued_by_depth: BTreeMap<u32, usize>,

    /// Discovered links dropped because their URL was already seen
    pub duplicates_skipped: usize,

    /// Discovered links dropped because they exceed the maximum depth
    pub too_deep_skipped: usize,

    /// Outcome counts of every dequeued task
    pub outcomes: BTreeMap<&'static str, usize>,

    /// Pages whose body was retrieved
    pub pages_fetched: usize,

    /// Records handed to the storage collaborator
    pub records_emitted: usize,

    /// Tasks still queued when the crawl stopped
    pub unvisited: usize,

    /// Whether the crawl was cancelled before the frontier drained
    pub cancelled: bool,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new(seed: Url, max_depth: u32) -> Self {
        Self {
            seed,
            max_depth,
            enqueued_by_depth: BTreeMap::new(),
            duplicates_skipped: 0,
            too_deep_skipped: 0,
            outcomes: BTreeMap::new(),
            pages_fetched: 0,
            records_emitted: 0,
            unvisited: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Records the frontier's answer to an offered task at `depth`
    pub fn record_offer(&mut self, depth: u32, offer: Offer) {
        match offer {
            Offer::Enqueued => *self.enqueued_by_depth.entry(depth).or_default() += 1,
            Offer::TooDeep => self.too_deep_skipped += 1,
            Offer::Duplicate => self.duplicates_skipped += 1,
        }
    }

    /// Records how a dequeued task finished
    pub fn record_outcome(&mut self, outcome: TaskOutcome) {
        *self.outcomes.entry(outcome.as_str()).or_default() += 1;
        if outcome.was_fetched() {
            self.pages_fetched += 1;
        }
    }

    /// Tasks queued at `depth`
    pub fn enqueued_at(&self, depth: u32) -> usize {
        self.enqueued_by_depth.get(&depth).copied().unwrap_or(0)
    }

    pub fn total_enqueued(&self) -> usize {
        self.enqueued_by_depth.values().sum()
    }

    /// Dequeued tasks that finished with `outcome`
    pub fn count(&self, outcome: TaskOutcome) -> usize {
        self.outcomes.get(outcome.as_str()).copied().unwrap_or(0)
    }

    pub fn robots_disallowed(&self) -> usize {
        self.count(TaskOutcome::Disallowed)
    }

    pub fn redirects(&self) -> usize {
        self.count(TaskOutcome::Redirected)
    }

    pub fn fetch_failures(&self) -> usize {
        self.count(TaskOutcome::FetchFailed)
    }

    pub fn extraction_failures(&self) -> usize {
        self.count(TaskOutcome::ExtractionFailed)
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crawl of {} (max depth {})", self.seed, self.max_depth)?;
        writeln!(f, "  Pages fetched:        {}", self.pages_fetched)?;
        writeln!(f, "  Records stored:       {}", self.records_emitted)?;
        for (depth, count) in &self.enqueued_by_depth {
            writeln!(f, "  Enqueued at depth {}:  {}", depth, count)?;
        }
        writeln!(f, "  Duplicates skipped:   {}", self.duplicates_skipped)?;
        writeln!(f, "  Beyond max depth:     {}", self.too_deep_skipped)?;
        writeln!(f, "  Redirects:            {}", self.redirects())?;
        writeln!(f, "  Disallowed (robots):  {}", self.robots_disallowed())?;
        writeln!(f, "  Fetch failures:       {}", self.fetch_failures())?;
        writeln!(f, "  Extraction failures:  {}", self.extraction_failures())?;
        if self.cancelled {
            writeln!(f, "  Cancelled with {} tasks unvisited", self.unvisited)?;
        }
        write!(f, "  Elapsed:              {:.2?}", self.elapsed)
    }
}
