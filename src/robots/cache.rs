//! Robots.txt caching implementation
//!
//! [`CachedRobots`] pairs parsed rules with the time they were fetched, and
//! [`RobotsCache`] shares them across every task of a crawl, keyed by origin.

use crate::robots::parser::robots_token;
use crate::robots::{fetch_robots, ParsedRobots, RobotsPolicy};
use crate::url::origin_key;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use url::Url;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new CachedRobots instance stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than `ttl`
    ///
    /// A `None` TTL never expires.
    pub fn is_stale(&self, ttl: Option<Duration>) -> bool {
        let Some(ttl) = ttl else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => self.age() > ttl,
            Err(_) => false,
        }
    }

    /// Returns the age of the cached robots.txt
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }

    /// Checks if a URL is allowed according to the cached robots.txt
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }
}

type Slot = Arc<OnceCell<CachedRobots>>;

/// Shared, lazily populated robots.txt cache
///
/// Lookups take a read lock on the origin map. Only a miss (or a stale entry)
/// upgrades to the write lock, and only long enough to install an empty slot;
/// the fetch itself runs inside that slot's `OnceCell`, so concurrent tasks for
/// the same origin wait for a single fetch while other origins proceed.
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    policy: RobotsPolicy,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `policy` - Outcome when robots.txt cannot be fetched
    /// * `ttl` - Maximum age of a cached entry; `None` keeps entries for the process lifetime
    pub fn new(client: Client, policy: RobotsPolicy, ttl: Option<Duration>) -> Self {
        Self {
            client,
            policy,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configured failure policy
    pub fn policy(&self) -> RobotsPolicy {
        self.policy
    }

    /// Answers whether `agent` may fetch `path` on `scheme://authority`
    ///
    /// Fetches `{scheme}://{authority}/robots.txt` on a cache miss. Fetch
    /// failures are resolved by the configured [`RobotsPolicy`].
    ///
    /// # Arguments
    ///
    /// * `scheme` - `http` or `https`
    /// * `authority` - Host with optional `:port`
    /// * `path` - Path (and query) being requested
    /// * `agent` - Full user agent string; its product token selects the group
    pub async fn is_allowed(&self, scheme: &str, authority: &str, path: &str, agent: &str) -> bool {
        let origin = format!("{}://{}", scheme, authority.to_lowercase());
        let target = format!("{}{}", origin, path);
        self.check(&origin, &target, agent).await
    }

    /// Convenience wrapper over [`RobotsCache::is_allowed`] for a full URL
    pub async fn allows(&self, url: &Url, agent: &str) -> bool {
        let Some(origin) = origin_key(url) else {
            return self.policy == RobotsPolicy::FailOpen;
        };
        self.check(&origin, url.as_str(), agent).await
    }

    /// Number of origins currently cached
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn check(&self, origin: &str, target: &str, agent: &str) -> bool {
        let slot = self.slot(origin).await;
        let cached = slot.get_or_init(|| self.fetch(origin)).await;
        cached.is_allowed(target, robots_token(agent))
    }

    async fn slot(&self, origin: &str) -> Slot {
        {
            let entries = self.entries.read().await;
            if let Some(slot) = entries.get(origin) {
                if !self.slot_is_stale(slot) {
                    return Arc::clone(slot);
                }
            }
        }

        let mut entries = self.entries.write().await;
        // Another task may have refreshed the slot while we waited for the write lock.
        match entries.get(origin) {
            Some(slot) if !self.slot_is_stale(slot) => Arc::clone(slot),
            _ => {
                tracing::debug!("robots.txt cache miss for {}", origin);
                let slot: Slot = Arc::new(OnceCell::new());
                entries.insert(origin.to_string(), Arc::clone(&slot));
                slot
            }
        }
    }

    fn slot_is_stale(&self, slot: &Slot) -> bool {
        slot.get().is_some_and(|cached| cached.is_stale(self.ttl))
    }

    async fn fetch(&self, origin: &str) -> CachedRobots {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching {}", robots_url);

        match fetch_robots(&self.client, &robots_url).await {
            Ok(parsed) => CachedRobots::new(parsed),
            Err(e) => {
                match self.policy {
                    RobotsPolicy::FailOpen => tracing::warn!(
                        "Could not fetch {} ({}); allowing all paths (fail-open)",
                        robots_url,
                        e
                    ),
                    RobotsPolicy::FailClosed => tracing::warn!(
                        "Could not fetch {} ({}); disallowing all paths (fail-closed)",
                        robots_url,
                        e
                    ),
                }
                CachedRobots::new(self.policy.fallback())
            }
        }
    }
}
