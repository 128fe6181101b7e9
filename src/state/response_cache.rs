use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    stored_at: Instant,
    ttl: Duration,
    tags: Vec<String>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

/// Upstream response bodies keyed by request identity, expiring by TTL and
/// droppable by tag. Only successful bodies are ever stored.
#[derive(Default)]
pub struct ResponseCache {
    /// request key → cached body
    entries: DashMap<String, CacheEntry>,
    /// tag → request keys carrying it
    tag_index: DashMap<String, DashSet<String>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh body for `key`, if any. Expired entries are evicted on sight.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_fresh(now) {
            return Some(entry.body.clone());
        }
        drop(entry);
        self.remove(key);
        None
    }

    pub fn put(&self, key: &str, body: String, ttl: Duration, tags: &[String]) {
        self.sweep_expired(Instant::now());
        // Replacing an entry must not leave the old tags pointing at it.
        self.remove(key);
        for tag in tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                stored_at: Instant::now(),
                ttl,
                tags: tags.to_vec(),
            },
        );
    }

    /// Drop every entry carrying `tag`. Returns how many entries were removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let Some((_, keys)) = self.tag_index.remove(tag) else {
            return 0;
        };
        keys.into_iter().filter(|key| self.remove(key)).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of tags that still point at a live entry.
    #[cfg(test)]
    pub fn tag_count(&self) -> usize {
        self.tag_index.len()
    }

    /// Evict every entry past its TTL, so keys that are never read again don't pile up.
    fn sweep_expired(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_fresh(now))
            .map(|e| e.key().clone())
            .collect();
        expired.iter().filter(|key| self.remove(key)).count()
    }

    fn remove(&self, key: &str) -> bool {
        let Some((_, entry)) = self.entries.remove(key) else {
            return false;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get(tag) {
                keys.remove(key);
            }
            self.tag_index.remove_if(tag, |_, keys| keys.is_empty());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ResponseCache::new();
        cache.put("GET a", "body".into(), Duration::from_secs(60), &tags(&["t1"]));
        assert_eq!(cache.get("GET a").as_deref(), Some("body"));
        assert_eq!(cache.get("GET b"), None);
    }

    #[test]
    fn expired_entry_is_evicted() {
        let cache = ResponseCache::new();
        cache.put("GET a", "body".into(), Duration::ZERO, &tags(&["t1"]));
        assert_eq!(cache.get("GET a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn unread_expired_entries_are_swept_on_put() {
        let cache = ResponseCache::new();
        for i in 0..1000 {
            cache.put(&format!("GET /feed?date={i}"), "x".into(), Duration::ZERO, &tags(&[&format!("day-{i}")]));
        }
        cache.put("GET other", "y".into(), Duration::from_secs(60), &tags(&["t1"]));
        assert_eq!(cache.get("GET other").as_deref(), Some("y"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.tag_count(), 1);
    }

    #[test]
    fn invalidated_tags_leave_no_index_behind() {
        let cache = ResponseCache::new();
        cache.put("GET a", "a".into(), Duration::from_secs(60), &tags(&["kbo-schedule-2025-09-12"]));
        assert_eq!(cache.invalidate_tag("kbo-schedule-2025-09-12"), 1);
        assert_eq!(cache.tag_count(), 0);
    }

    #[test]
    fn invalidate_by_tag() {
        let cache = ResponseCache::new();
        cache.put("GET a", "a".into(), Duration::from_secs(60), &tags(&["rankings"]));
        cache.put("GET b", "b".into(), Duration::from_secs(60), &tags(&["rankings", "offense"]));
        cache.put("GET c", "c".into(), Duration::from_secs(60), &tags(&["defense"]));

        assert_eq!(cache.invalidate_tag("rankings"), 2);
        assert_eq!(cache.get("GET a"), None);
        assert_eq!(cache.get("GET b"), None);
        assert_eq!(cache.get("GET c").as_deref(), Some("c"));
        assert_eq!(cache.invalidate_tag("rankings"), 0);
        // "offense" only pointed at b, which is already gone.
        assert_eq!(cache.invalidate_tag("offense"), 0);
    }

    #[test]
    fn replacing_entry_retags() {
        let cache = ResponseCache::new();
        cache.put("GET a", "old".into(), Duration::from_secs(60), &tags(&["old-tag"]));
        cache.put("GET a", "new".into(), Duration::from_secs(60), &tags(&["new-tag"]));
        assert_eq!(cache.invalidate_tag("old-tag"), 0);
        assert_eq!(cache.get("GET a").as_deref(), Some("new"));
        assert_eq!(cache.invalidate_tag("new-tag"), 1);
    }
}
