//! In-memory dashboard aggregate cache with TTL expiry.
//!
//! Thread-safety comes from DashMap: request handlers and the invalidation
//! consumer hit the same map concurrently without an outer lock. Entries are
//! never mutated in place, only replaced wholesale.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use super::DashboardAggregate;

#[derive(Debug, Clone)]
struct CacheEntry {
    aggregate: DashboardAggregate,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Counters for observability endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Read-through cache of composed dashboard aggregates, keyed by subject id.
///
/// Constructed once at startup and injected as an `Arc`; there is no global
/// state. Concurrent misses for the same subject are not coalesced, so
/// duplicate fetches under contention are possible — an accepted trade-off.
pub struct DashboardCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl DashboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Unexpired cached aggregate for the subject, if any.
    ///
    /// Expired entries are dropped lazily on access.
    pub fn get(&self, subject_id: &str) -> Option<DashboardAggregate> {
        match self.store.get(subject_id) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.aggregate.clone())
            }
            Some(entry) => {
                drop(entry);
                self.store.remove(subject_id);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store (replace wholesale) the aggregate for its subject
    pub fn insert(&self, aggregate: DashboardAggregate) {
        let entry = CacheEntry {
            expires_at: Instant::now() + self.ttl,
            aggregate,
        };
        self.store.insert(entry.aggregate.subject_id.clone(), entry);
    }

    /// Drop the subject's entry. No-op when absent, which keeps the
    /// at-least-once invalidation consumer idempotent.
    pub fn invalidate(&self, subject_id: &str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        if self.store.remove(subject_id).is_some() {
            debug!(subject_id, "dashboard cache entry evicted");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn aggregate(subject: &str) -> DashboardAggregate {
        DashboardAggregate {
            subject_id: subject.to_string(),
            user: None,
            entries: Vec::new(),
            tasks: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn get_after_insert_hits() {
        let cache = DashboardCache::new(Duration::from_secs(60));
        cache.insert(aggregate("user-1"));

        assert!(cache.get("user-1").is_some());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn expired_entry_misses() {
        let cache = DashboardCache::new(Duration::from_millis(0));
        cache.insert(aggregate("user-1"));

        assert!(cache.get("user-1").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn invalidate_is_idempotent() {
        let cache = DashboardCache::new(Duration::from_secs(60));
        cache.insert(aggregate("user-1"));

        cache.invalidate("user-1");
        cache.invalidate("user-1");
        cache.invalidate("never-cached");

        assert!(cache.get("user-1").is_none());
        assert_eq!(cache.stats().invalidations, 3);
    }
}
