//! Per-domain politeness delays
//!
//! Every domain gets its own [`DomainThrottleState`]; tasks for different
//! domains never wait on each other.

use crate::config::CrawlerConfig;
use crate::state::DomainThrottleState;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Enforces a minimum, jittered interval between requests to the same domain
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    max_jitter: Duration,
    domains: DashMap<String, Arc<DomainThrottleState>>,
}

impl RateLimiter {
    /// Creates a rate limiter
    ///
    /// # Arguments
    ///
    /// * `min_delay` - Fixed spacing between requests to one domain
    /// * `max_jitter` - Upper bound of the uniform random delay added per request
    pub fn new(min_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            min_delay,
            max_jitter,
            domains: DashMap::new(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.min_delay(), config.max_delay())
    }

    /// Blocks until `domain` may receive another request, then records it
    ///
    /// Only tasks targeting the same domain are held back.
    ///
    /// # Returns
    ///
    /// How long the caller waited
    pub async fn wait(&self, domain: &str) -> Duration {
        let state = self.state_for(domain);
        let interval = self.next_interval();

        let waited = state.reserve(interval).await;
        if !waited.is_zero() {
            tracing::debug!("Waited {:?} before requesting {}", waited, domain);
        }
        waited
    }

    /// Number of requests permitted so far for `domain`
    pub fn request_count(&self, domain: &str) -> u64 {
        self.domains
            .get(domain)
            .map(|state| state.request_count())
            .unwrap_or(0)
    }

    /// Number of domains with throttle state
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    fn state_for(&self, domain: &str) -> Arc<DomainThrottleState> {
        let entry = self.domains.entry(domain.to_string()).or_default();
        Arc::clone(entry.value())
    }

    fn next_interval(&self) -> Duration {
        self.min_delay + random_jitter(self.max_jitter)
    }
}

/// Picks a delay uniformly from `[0, max]` at millisecond resolution
fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
