use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use super::{RateLimitDecision, RateLimitStore};

const DEFAULT_SHARD_COUNT: usize = 16;
const DEFAULT_MAX_BUCKETS: usize = 10_000;

#[derive(Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

impl Bucket {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window,
        }
    }

    fn check_and_increment(&mut self, now: Instant, limit: u32, window: Duration) -> bool {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }
}

/// Sharded in-memory fixed-window counters.
///
/// Keys are hashed onto independent shards so concurrent clients rarely
/// contend on the same lock.
#[derive(Clone)]
pub struct InMemoryRateLimitStore {
    shards: Vec<Arc<Mutex<HashMap<String, Bucket>>>>,
    limit: u32,
    window: Duration,
    max_buckets: usize,
}

impl InMemoryRateLimitStore {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_shards(limit, window, DEFAULT_SHARD_COUNT)
    }

    pub fn with_shards(limit: u32, window: Duration, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            limit,
            window,
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    fn evict_if_full(&self, buckets: &mut HashMap<String, Bucket>, now: Instant) {
        if buckets.len() < self.max_buckets {
            return;
        }

        buckets.retain(|_key, bucket| bucket.reset_at > now);

        if buckets.len() >= self.max_buckets {
            let oldest_key = buckets
                .iter()
                .min_by_key(|(_, bucket)| bucket.reset_at)
                .map(|(k, _)| k.clone());
            if let Some(key) = oldest_key {
                buckets.remove(&key);
                tracing::debug!(
                    remaining_buckets = buckets.len(),
                    "Evicted oldest rate limit bucket due to capacity limit"
                );
            }
        }
    }
}

/// Wall-clock instant corresponding to `reset_in` from now, as whole seconds
/// rounded up.
fn unix_reset_secs(reset_in: Duration) -> u64 {
    let at = SystemTime::now() + reset_in;
    let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    if since_epoch.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;

        if !buckets.contains_key(key) {
            self.evict_if_full(&mut buckets, now);
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(now, self.window));

        let allowed = bucket.check_and_increment(now, self.limit, self.window);
        let reset_in = bucket.reset_at.saturating_duration_since(now);

        RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(bucket.count),
            reset_at: unix_reset_secs(reset_in),
            retry_after: reset_in,
        }
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut total_cleaned = 0;

        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before = buckets.len();
            buckets.retain(|_key, bucket| bucket.reset_at > now);
            total_cleaned += before - buckets.len();
        }

        if total_cleaned > 0 {
            tracing::debug!(
                buckets_cleaned = total_cleaned,
                "Cleaned up expired rate limit buckets"
            );
        }

        total_cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_is_enforced_per_window() {
        let store = InMemoryRateLimitStore::new(30, Duration::from_secs(60));

        for i in 1..=30u32 {
            let decision = store.hit("ip:10.0.0.1").await;
            assert!(decision.allowed, "request {} rejected", i);
            assert_eq!(decision.remaining, 30 - i);
        }

        let decision = store.hit("ip:10.0.0.1").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let store = InMemoryRateLimitStore::new(2, Duration::from_secs(60));
        store.hit("ip:a").await;
        store.hit("ip:a").await;
        assert!(!store.hit("ip:a").await.allowed);

        let other = store.hit("ip:b").await;
        assert!(other.allowed);
        assert_eq!(other.remaining, 1);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let store = InMemoryRateLimitStore::new(1, Duration::from_millis(50));
        assert!(store.hit("k").await.allowed);
        assert!(!store.hit("k").await.allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let decision = store.hit("k").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_reset_is_in_the_future() {
        let store = InMemoryRateLimitStore::new(5, Duration::from_secs(60));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let decision = store.hit("k").await;
        assert!(decision.reset_at > now);
        assert!(decision.reset_at <= now + 61);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemoryRateLimitStore::with_shards(5, Duration::from_millis(20), 4);
        store.hit("a").await;
        store.hit("b").await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.purge_expired().await, 0);
    }
}
