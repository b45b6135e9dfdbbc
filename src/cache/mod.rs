//! Short-lived page cache in front of the index feed.
//!
//! Stored bodies are never invalidated by content changes. Freshness is
//! bounded by `cache.ttl_seconds` (20 by default) or an explicit clear from
//! the admin listener:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 20
//! capacity = 64
//! key_policy = "per_page"   # or "route_only"
//! ```

mod config;
mod keys;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKeyPolicy, PageCacheKey};
pub use middleware::{PageCacheState, page_cache_layer};
pub use store::{
    CachedPage, METRIC_CLEAR_TOTAL, METRIC_EVICT_TOTAL, METRIC_EXPIRED_TOTAL, METRIC_HIT_TOTAL,
    METRIC_MISS_TOTAL, PageCache,
};
