//! Fixed-window request rate limiting
//!
//! [`RateLimitStore`] is the seam between the HTTP middleware and the counter
//! storage. [`InMemoryRateLimitStore`] keeps counters in process memory, which
//! is correct for a single instance; a shared counter service can implement
//! the same trait for multi-instance deployments.

mod memory;

pub use memory::InMemoryRateLimitStore;

use async_trait::async_trait;
use std::time::Duration;

/// Result of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests permitted per window
    pub limit: u32,
    /// Requests left in the current window, never negative
    pub remaining: u32,
    /// Unix time (seconds, rounded up) at which the window resets
    pub reset_at: u64,
    /// Time until the window resets
    pub retry_after: Duration,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and decide whether it may proceed.
    async fn hit(&self, key: &str) -> RateLimitDecision;

    /// Drop counters whose window has ended.
    async fn purge_expired(&self) -> usize;
}
