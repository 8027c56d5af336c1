//! TTL-bound cache of validated (token, environment) pairs.
//!
//! # Design Decisions
//! - The cache is the only shared mutable state in the gateway; a concurrent
//!   map keeps reads and writes mutually exclusive per shard
//! - Expiry and environment mismatch both count as a miss and evict the
//!   stale entry, so the map only ever holds entries believed valid
//! - The clock is injected to make TTL behavior testable without real delays

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;

/// Time source for cache expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock backed implementation used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    environment: String,
    /// Strictly in the future at insertion time.
    expires_at: Instant,
}

/// Process-wide cache of previously validated tokens.
#[derive(Debug, Default)]
pub struct AuthCache {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
}

impl AuthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `(token, environment)` is cached and unexpired at `now`.
    /// Stale entries found on lookup are evicted.
    pub fn check(&self, token: &str, environment: &str, now: Instant) -> bool {
        if let Some(entry) = self.entries.get(token) {
            if entry.environment == environment && entry.expires_at > now {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_auth_cache_hit();
                tracing::debug!("Token is authenticated from cache");
                return true;
            }
        }

        // Expired or bound to a different environment.
        self.entries.remove(token);
        false
    }

    /// Record a freshly validated token.
    pub fn insert(&self, token: &str, environment: &str, now: Instant, ttl: Duration) {
        self.entries.insert(
            token.to_string(),
            CacheEntry {
                environment: environment.to_string(),
                expires_at: now + ttl,
            },
        );
    }

    /// Number of cache hits since process start.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn hit_requires_same_environment_and_unexpired_entry() {
        let cache = AuthCache::new();
        let now = Instant::now();
        cache.insert("t-1", "production", now, TTL);

        assert!(cache.check("t-1", "production", now + Duration::from_secs(30)));
        assert!(!cache.check("t-1", "staging", now));
        // The environment mismatch evicted the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_is_treated_as_absent_and_purged() {
        let cache = AuthCache::new();
        let now = Instant::now();
        cache.insert("t-1", "production", now, TTL);

        assert!(!cache.check("t-1", "production", now + TTL));
        assert!(cache.is_empty());
    }

    #[test]
    fn unknown_token_is_a_miss() {
        let cache = AuthCache::new();
        assert!(!cache.check("t-unknown", "production", Instant::now()));
    }

    #[test]
    fn hits_are_counted() {
        let cache = AuthCache::new();
        let now = Instant::now();
        cache.insert("t-1", "production", now, TTL);

        cache.check("t-1", "production", now);
        cache.check("t-1", "production", now);
        assert_eq!(cache.hits(), 2);
    }
}
