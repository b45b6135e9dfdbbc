//! TTL-boxed LRU store for assembled page bodies.
//!
//! Entries are never invalidated by writes elsewhere in the service. They
//! leave the store only when their TTL passes (checked on read), when the LRU
//! pushes them out, or on [`PageCache::clear`].

use std::sync::RwLock;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::keys::PageCacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub const METRIC_HIT_TOTAL: &str = "yatube_page_cache_hit_total";
pub const METRIC_MISS_TOTAL: &str = "yatube_page_cache_miss_total";
pub const METRIC_EXPIRED_TOTAL: &str = "yatube_page_cache_expired_total";
pub const METRIC_EVICT_TOTAL: &str = "yatube_page_cache_evict_total";
pub const METRIC_CLEAR_TOTAL: &str = "yatube_page_cache_clear_total";

/// A fully assembled response as it left the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    page: CachedPage,
    expires_at: Instant,
}

pub struct PageCache {
    entries: RwLock<LruCache<PageCacheKey, Entry>>,
}

impl PageCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    /// Returns the stored page unless it has expired, in which case it is dropped.
    pub fn get(&self, key: &PageCacheKey) -> Option<CachedPage> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        match entries.get(key) {
            None => {
                counter!(METRIC_MISS_TOTAL).increment(1);
                return None;
            }
            Some(entry) if entry.expires_at > now => {
                counter!(METRIC_HIT_TOTAL).increment(1);
                return Some(entry.page.clone());
            }
            Some(_) => {}
        }

        entries.pop(key);
        counter!(METRIC_EXPIRED_TOTAL).increment(1);
        counter!(METRIC_MISS_TOTAL).increment(1);
        None
    }

    /// Store `page` under `key` for `ttl`. Returns the key pushed out by the LRU, if any.
    pub fn put(&self, key: PageCacheKey, page: CachedPage, ttl: Duration) -> Option<PageCacheKey> {
        let entry = Entry {
            page,
            expires_at: Instant::now() + ttl,
        };
        let replaced = rw_write(&self.entries, SOURCE, "put").push(key.clone(), entry);

        match replaced {
            Some((old_key, _)) if old_key != key => {
                counter!(METRIC_EVICT_TOTAL).increment(1);
                Some(old_key)
            }
            _ => None,
        }
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        counter!(METRIC_CLEAR_TOTAL).increment(1);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::application::pagination::PageNumber;
    use crate::cache::keys::CacheKeyPolicy;

    use super::*;

    fn key(page: u32) -> PageCacheKey {
        PageCacheKey::new(CacheKeyPolicy::PerPage, "/", PageNumber::new(page))
    }

    fn page(body: &'static str) -> CachedPage {
        CachedPage {
            status: 200,
            headers: vec![("content-type".into(), "application/json".into())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entries_live_until_ttl() {
        let cache = PageCache::new(&CacheConfig::default());
        let ttl = Duration::from_secs(20);

        cache.put(key(1), page("first"), ttl);
        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(cache.get(&key(1)), Some(page("first")));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&key(1)), None);
        assert!(cache.is_empty(), "expired entry is dropped on read");
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = PageCache::new(&CacheConfig::default());
        cache.put(key(1), page("a"), Duration::from_secs(20));
        cache.put(key(2), page("b"), Duration::from_secs(20));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recent() {
        let config = CacheConfig {
            capacity: 1,
            ..Default::default()
        };
        let cache = PageCache::new(&config);
        let ttl = Duration::from_secs(20);

        assert_eq!(cache.put(key(1), page("a"), ttl), None);
        assert_eq!(cache.put(key(1), page("a2"), ttl), None, "same key replaces");
        assert_eq!(cache.put(key(2), page("b"), ttl), Some(key(1)));
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.get(&key(2)), Some(page("b")));
    }

    #[tokio::test]
    async fn recovers_from_poisoned_lock() {
        let cache = PageCache::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("lock should be acquired");
            panic!("poison page cache lock");
        }));

        cache.put(key(1), page("after"), Duration::from_secs(5));
        assert_eq!(cache.get(&key(1)), Some(page("after")));
    }
}
