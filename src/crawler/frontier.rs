//! Crawl frontier and visited-set bookkeeping
//!
//! The frontier is a FIFO queue of [`CrawlTask`]s, which gives breadth-first
//! expansion from the seed. It is owned by a single coordinator, so only the
//! [`VisitedSet`] needs interior synchronization.

use crate::url::normalize_url;
use dashmap::DashSet;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL together with its discovery depth and the seed it descended from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The URL to fetch (fragment already removed)
    pub url: Url,

    /// Number of hops from the seed; the seed itself is depth 0
    pub depth: u32,

    /// The seed URL this task descended from
    pub seed: Url,

    /// Redirect hops taken to reach this URL from a discovered link
    pub redirects: u32,
}

impl CrawlTask {
    /// Creates the depth-0 task for a seed URL
    pub fn root(seed: Url) -> Self {
        Self {
            url: seed.clone(),
            depth: 0,
            seed,
            redirects: 0,
        }
    }

    /// Creates a task for a link discovered on this task's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            seed: self.seed.clone(),
            redirects: 0,
        }
    }

    /// Creates the task for this task's redirect target
    ///
    /// A redirect is not a new hop: the depth is unchanged.
    pub fn redirect(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth,
            seed: self.seed.clone(),
            redirects: self.redirects + 1,
        }
    }
}

/// Normalized URLs already dequeued or in flight during one crawl run
///
/// Membership test and insertion happen in a single atomic operation.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key as visited
    ///
    /// Returns true if the key was not present before this call.
    pub fn insert_if_new(&self, key: &str) -> bool {
        self.urls.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.urls.contains(key)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Returns the key a URL is deduplicated under
///
/// Falls back to the raw URL when normalization rejects it.
pub fn visit_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|normalized| normalized.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Result of offering a task to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The task was queued
    Enqueued,

    /// The task is deeper than the configured maximum and was discarded
    TooDeep,

    /// The URL is already visited or already queued
    Duplicate,
}

/// FIFO queue of crawl tasks for a single run
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    queued: HashSet<String>,
    visited: VisitedSet,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier that discards tasks deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: VisitedSet::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Queues a task unless it is too deep or its URL was already seen
    pub fn offer(&mut self, task: CrawlTask) -> Offer {
        if task.depth > self.max_depth {
            return Offer::TooDeep;
        }

        let key = visit_key(&task.url);
        if self.visited.contains(&key) || !self.queued.insert(key) {
            return Offer::Duplicate;
        }

        self.queue.push_back(task);
        Offer::Enqueued
    }

    /// Dequeues the next task and marks its URL visited
    ///
    /// Tasks whose URL was visited after they were queued are dropped.
    pub fn next(&mut self) -> Option<CrawlTask> {
        while let Some(task) = self.queue.pop_front() {
            let key = visit_key(&task.url);
            self.queued.remove(&key);
            if self.visited.insert_if_new(&key) {
                return Some(task);
            }
            tracing::debug!("Dropping already visited {}", task.url);
        }
        None
    }

    /// Number of tasks waiting to be dequeued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }
}
