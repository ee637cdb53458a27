//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskOutcome`: How each dequeued crawl task finished (processed, disallowed, failed, etc.)
//! - `DomainThrottleState`: Per-domain last-request timestamp shared by the rate limiter

mod domain_state;
mod task_state;

// Re-export main types
pub use domain_state::{time_until_next_request, DomainThrottleState};
pub use task_state::TaskOutcome;
