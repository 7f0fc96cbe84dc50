use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Eviction rules for a [`Cache`].
///
/// `capacity` bounds the number of entries with least-recently-used
/// eviction; `ttl` expires entries. Both are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    pub capacity: Option<NonZeroUsize>,
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = NonZeroUsize::new(capacity);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Size at which an insert first sweeps the whole cache for expired entries.
const MIN_SWEEP_WATERMARK: usize = 64;

/// Keyed in-memory cache owned by a single service instance.
///
/// With a TTL, expired entries are dropped on read, from the least recently
/// used end on every insert, and by a full sweep whenever the cache has
/// doubled since the previous one. Expired entries therefore never pile up
/// even without a capacity.
#[derive(Debug)]
pub struct Cache<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    ttl: Option<Duration>,
    sweep_watermark: usize,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match policy.capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            entries,
            ttl: policy.ttl,
            sweep_watermark: MIN_SWEEP_WATERMARK,
            hits: 0,
            misses: 0,
        }
    }

    /// Returns a copy of the cached value, dropping it first when it expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match (self.entries.get(key), self.ttl) {
            (Some(entry), Some(ttl)) => entry.stored_at.elapsed() > ttl,
            (Some(_), None) => false,
            (None, _) => {
                self.misses += 1;
                return None;
            }
        };
        if expired {
            self.entries.pop(key);
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.evict_stale_tail();
        if self.entries.len() >= self.sweep_watermark {
            self.purge_expired();
            self.sweep_watermark = (self.entries.len() * 2).max(MIN_SWEEP_WATERMARK);
        }
        self.entries.put(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Removes every expired entry.
    pub fn purge_expired(&mut self) {
        let Some(ttl) = self.ttl else {
            return;
        };
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.stored_at.elapsed() > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
        }
    }

    fn evict_stale_tail(&mut self) {
        let Some(ttl) = self.ttl else {
            return;
        };
        while self
            .entries
            .peek_lru()
            .is_some_and(|(_, entry)| entry.stored_at.elapsed() > ttl)
        {
            self.entries.pop_lru();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Share of lookups answered from the cache, 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_keeps_everything() {
        let mut cache: Cache<String, f64> = Cache::new(CachePolicy::unbounded());
        for i in 0..500 {
            cache.insert(format!("k{}", i), i as f64);
        }
        assert_eq!(cache.len(), 500);
        assert_eq!(cache.get(&"k0".to_string()), Some(0.0));
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut cache: Cache<&str, u32> = Cache::new(CachePolicy::unbounded().with_capacity(2));
        cache.insert("a", 1);
        cache.insert("b", 2);
        // touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get(&"a"), Some(1));
        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_ttl_expires_entries() {
        let mut cache: Cache<&str, u32> =
            Cache::new(CachePolicy::unbounded().with_ttl(Duration::from_millis(1)));
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_entries_that_are_never_read() {
        let mut cache: Cache<String, u32> =
            Cache::new(CachePolicy::unbounded().with_ttl(Duration::from_millis(1)));
        for i in 0..1000 {
            cache.insert(format!("old{}", i), i);
        }
        std::thread::sleep(Duration::from_millis(10));
        for i in 0..1000 {
            cache.insert(format!("new{}", i), i);
        }
        assert!(cache.len() <= 1000, "{} entries kept", cache.len());
        assert_eq!(cache.get(&"old0".to_string()), None);
    }

    #[test]
    fn test_purge_reaches_recently_used_expired_entries() {
        let ttl = Duration::from_millis(200);
        let mut cache: Cache<&str, u32> = Cache::new(CachePolicy::unbounded().with_ttl(ttl));
        cache.insert("early", 1);
        std::thread::sleep(Duration::from_millis(120));
        cache.insert("late", 2);
        // reading "early" moves it away from the least recently used end
        assert_eq!(cache.get(&"early"), Some(1));
        std::thread::sleep(Duration::from_millis(120));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"late"), Some(2));
    }

    #[test]
    fn test_hit_rate() {
        let mut cache: Cache<&str, u32> = Cache::new(CachePolicy::unbounded());
        assert_eq!(cache.hit_rate(), 0.0);
        cache.insert("a", 1);
        cache.get(&"a");
        cache.get(&"b");
        assert_eq!(cache.hit_rate(), 0.5);
    }

    #[test]
    fn test_zero_capacity_means_unbounded() {
        let policy = CachePolicy::unbounded().with_capacity(0);
        assert_eq!(policy.capacity, None);
    }
}
