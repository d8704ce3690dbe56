//! Tag-indexed cache of serialized HTTP responses.
//!
//! Sits in front of the dashboard handler: a cached body is served without
//! touching the composer at all. Every entry carries a tag (the subject id)
//! so the invalidation consumer can evict all responses for a subject in
//! one call.

use dashmap::DashMap;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedResponse {
    body: String,
    tag: String,
    expires_at: Instant,
}

/// Serialized-response cache with tag-based eviction
pub struct TaggedResponseCache {
    entries: DashMap<String, CachedResponse>,
    tags: DashMap<String, HashSet<String>>,
    ttl: Duration,
}

impl TaggedResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            tags: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.body.clone()),
            Some(entry) => {
                let tag = entry.tag.clone();
                drop(entry);
                self.entries.remove(key);
                self.untag(&tag, key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, tag: impl Into<String>, body: String) {
        let key = key.into();
        let tag = tag.into();

        self.entries.insert(
            key.clone(),
            CachedResponse {
                body,
                tag: tag.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        self.tags.entry(tag).or_default().insert(key);
    }

    /// Evict every response tagged with `tag`. No-op for unknown tags.
    pub fn evict_tag(&self, tag: &str) {
        let Some((_, keys)) = self.tags.remove(tag) else {
            return;
        };
        for key in &keys {
            self.entries.remove(key);
        }
        debug!(tag, evicted = keys.len(), "tagged responses evicted");
    }

    fn untag(&self, tag: &str, key: &str) {
        let emptied = match self.tags.get_mut(tag) {
            Some(mut keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => false,
        };
        // The guard must be released before touching the map again, and a
        // concurrent insert may have re-populated the set in between.
        if emptied {
            self.tags.remove_if(tag, |_, keys| keys.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cache = TaggedResponseCache::new(Duration::from_secs(60));
        cache.insert("dashboard:user-1", "user-1", "{\"a\":1}".to_string());

        assert_eq!(cache.get("dashboard:user-1").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn evict_tag_drops_all_tagged_keys() {
        let cache = TaggedResponseCache::new(Duration::from_secs(60));
        cache.insert("dashboard:user-1", "user-1", "one".to_string());
        cache.insert("dashboard:user-1?v=2", "user-1", "two".to_string());
        cache.insert("dashboard:user-2", "user-2", "other".to_string());

        cache.evict_tag("user-1");

        assert!(cache.get("dashboard:user-1").is_none());
        assert!(cache.get("dashboard:user-1?v=2").is_none());
        assert!(cache.get("dashboard:user-2").is_some());
    }

    #[test]
    fn evict_unknown_tag_is_a_no_op() {
        let cache = TaggedResponseCache::new(Duration::from_secs(60));
        cache.evict_tag("ghost");
        cache.evict_tag("ghost");
    }

    #[test]
    fn expired_entry_is_dropped() {
        let cache = TaggedResponseCache::new(Duration::from_millis(0));
        cache.insert("k", "tag", "body".to_string());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn lazy_expiry_leaves_no_empty_tag_sets() {
        let cache = TaggedResponseCache::new(Duration::from_millis(0));
        cache.insert("dashboard:user-1", "user-1", "body".to_string());
        cache.insert("dashboard:user-2", "user-2", "body".to_string());

        assert!(cache.get("dashboard:user-1").is_none());
        assert!(cache.get("dashboard:user-2").is_none());

        assert!(cache.entries.is_empty());
        assert!(cache.tags.is_empty());
    }
}
