use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Tracks the politeness state of a domain during crawling
///
/// One instance exists per domain and is shared by every task targeting that
/// domain. The last-request timestamp sits behind an async mutex that is held
/// while a task waits for its slot, so two tasks can never compute the same
/// "next allowed" time and same-domain dispatch is serialized.
#[derive(Debug, Default)]
pub struct DomainThrottleState {
    /// Timestamp of the last permitted request to this domain
    last_request: Mutex<Option<Instant>>,

    /// Number of requests permitted for this domain in the current crawl
    request_count: AtomicU64,
}

impl DomainThrottleState {
    /// Creates a new DomainThrottleState with no request history
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `interval` has elapsed since the previous permitted request,
    /// then records a new request
    ///
    /// The first request to a domain proceeds immediately.
    ///
    /// # Returns
    ///
    /// How long the caller was made to wait
    pub async fn reserve(&self, interval: Duration) -> Duration {
        let mut last_request = self.last_request.lock().await;
        let started = Instant::now();

        if let Some(wait) = time_until_next_request(*last_request, interval, started) {
            tokio::time::sleep(wait).await;
        }

        let now = Instant::now();
        *last_request = Some(now);
        self.request_count.fetch_add(1, Ordering::SeqCst);

        now.duration_since(started)
    }

    /// Returns the number of requests recorded for this domain
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Returns the timestamp of the last permitted request, if any
    pub async fn last_request(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }
}

/// Calculates the time until the next request can be made
///
/// Returns None if a request can be made now, or the duration to wait otherwise.
pub fn time_until_next_request(
    last_request: Option<Instant>,
    interval: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = last_request?;
    let elapsed = now.saturating_duration_since(last);
    (elapsed < interval).then(|| interval - elapsed)
}
