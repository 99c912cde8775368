//! In-process read-through cache for catalog responses.
//!
//! A TTL-only cache: entries expire at an absolute deadline and are never
//! evicted for size (the key space is bounded by the distinct query shapes
//! actually issued). Expiry is enforced lazily on read, and a periodic
//! sweep purges expired entries so memory stays bounded even without read
//! traffic.
//!
//! Catalog mutations call [`CatalogCache::invalidate_catalog`], which drops
//! every entry in every catalog namespace. Coarse on purpose: correctness
//! over hit rate; no attempt is made to work out which list pages a
//! mutated product could appear on.
//!
//! The cache is owned by `AppState` and shared across request handlers;
//! `DashMap` gives atomic single-key operations, and no cross-key guarantee
//! is offered or needed (a read may be stale for up to its TTL after an
//! unrelated write).

pub mod key;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::models::{Product, ProductPage, ProductStats};

/// TTL policy per catalog namespace. Differentiation reflects volatility:
/// categories and stats change rarely, list/detail change whenever any
/// product mutates.
pub mod ttl {
    use std::time::Duration;

    /// Product list pages.
    pub const LIST: Duration = Duration::from_secs(300);
    /// Single-product reads.
    pub const DETAIL: Duration = Duration::from_secs(600);
    /// Distinct-categories list.
    pub const CATEGORIES: Duration = Duration::from_secs(1800);
    /// Aggregate catalog statistics.
    pub const STATS: Duration = Duration::from_secs(900);
    /// Catalog counts.
    pub const COUNT: Duration = Duration::from_secs(300);
}

/// How often the background sweep purges expired entries.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// A cached catalog response.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Page(ProductPage),
    Product(Box<Product>),
    Categories(Vec<String>),
    Stats(ProductStats),
    Count(i64),
}

/// Cache counters for the admin stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub entries: usize,
}

struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct CacheInner {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

/// Process-wide catalog response cache.
///
/// Cheaply cloneable; clones share the same underlying map and counters.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<CacheInner>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                sets: AtomicU64::new(0),
            }),
        }
    }

    /// Look up a key. Expired entries are treated as absent (and removed).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();

        // The map guard must be dropped before the expired-entry removal
        // below; removing a key while holding its shard guard would
        // deadlock.
        let (value, expired) = match self.inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => (Some(entry.value.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };

        if expired {
            self.inner.entries.remove(key);
        }

        if value.is_some() {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.misses.fetch_add(1, Ordering::Relaxed);
        }

        value
    }

    /// Store a value under a key with the given time-to-live.
    pub fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) {
        self.inner.sets.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry in every catalog namespace.
    ///
    /// Returns how many entries were removed.
    pub fn invalidate_catalog(&self) -> usize {
        let before = self.inner.entries.len();
        self.inner.entries.retain(|key, _| {
            !key::CATALOG_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
        });
        before.saturating_sub(self.inner.entries.len())
    }

    /// Remove expired entries. Called by the background sweep; safe to call
    /// from anywhere.
    ///
    /// Returns how many entries were purged.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.inner.entries.len())
    }

    /// Current counters and entry count.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            sets: self.inner.sets.load(Ordering::Relaxed),
            entries: self.inner.entries.len(),
        }
    }

    /// Run the periodic sweep until the process shuts down.
    ///
    /// Spawned once from `main`; ticks every [`SWEEP_PERIOD`].
    pub async fn sweep_loop(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        // The first tick fires immediately; skip it.
        interval.tick().await;

        loop {
            interval.tick().await;
            let purged = self.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "cache sweep removed expired entries");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn categories(values: &[&str]) -> CachedValue {
        CachedValue::Categories(values.iter().map(|&v| v.to_owned()).collect())
    }

    fn assert_categories(value: Option<CachedValue>, expected: &[&str]) {
        match value {
            Some(CachedValue::Categories(got)) => assert_eq!(got, expected),
            other => panic!("expected categories, got {other:?}"),
        }
    }

    #[test]
    fn test_get_returns_what_was_set() {
        let cache = CatalogCache::new();
        cache.set("categories_list", categories(&["soap"]), ttl::CATEGORIES);

        assert_categories(cache.get("categories_list"), &["soap"]);
    }

    #[test]
    fn test_entry_expires_after_ttl_without_sweep() {
        let cache = CatalogCache::new();
        cache.set(
            "categories_list",
            categories(&["soap"]),
            Duration::from_millis(40),
        );

        assert!(cache.get("categories_list").is_some());
        std::thread::sleep(Duration::from_millis(80));
        // No sweep has run; lazy expiry alone must hide the entry.
        assert!(cache.get("categories_list").is_none());
    }

    #[test]
    fn test_set_replaces_and_extends() {
        let cache = CatalogCache::new();
        cache.set(
            "categories_list",
            categories(&["soap"]),
            Duration::from_millis(40),
        );
        cache.set("categories_list", categories(&["candles"]), ttl::CATEGORIES);

        std::thread::sleep(Duration::from_millis(80));
        assert_categories(cache.get("categories_list"), &["candles"]);
    }

    #[test]
    fn test_invalidate_catalog_clears_every_namespace() {
        let cache = CatalogCache::new();
        cache.set("products_list|cat=|q=", categories(&["x"]), ttl::LIST);
        cache.set("product_detail|abc", categories(&["x"]), ttl::DETAIL);
        cache.set("products_count|all", CachedValue::Count(7), ttl::COUNT);
        cache.set("categories_list", categories(&["x"]), ttl::CATEGORIES);
        cache.set("product_stats", CachedValue::Count(0), ttl::STATS);

        let removed = cache.invalidate_catalog();

        assert_eq!(removed, 5);
        assert!(cache.get("products_list|cat=|q=").is_none());
        assert!(cache.get("product_detail|abc").is_none());
        assert!(cache.get("products_count|all").is_none());
        assert!(cache.get("categories_list").is_none());
        assert!(cache.get("product_stats").is_none());
    }

    #[test]
    fn test_purge_expired_only_removes_dead_entries() {
        let cache = CatalogCache::new();
        cache.set("categories_list", categories(&["a"]), Duration::from_millis(20));
        cache.set("product_stats", CachedValue::Count(1), ttl::STATS);

        std::thread::sleep(Duration::from_millis(50));
        let purged = cache.purge_expired();

        assert_eq!(purged, 1);
        assert_eq!(cache.stats().entries, 1);
        assert!(cache.get("product_stats").is_some());
    }

    #[test]
    fn test_stats_count_hits_misses_sets() {
        let cache = CatalogCache::new();
        cache.set("categories_list", categories(&["a"]), ttl::CATEGORIES);

        let _hit = cache.get("categories_list");
        let _miss = cache.get("product_stats");
        let _miss2 = cache.get("nope");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = CatalogCache::new();
        let clone = cache.clone();

        clone.set("categories_list", categories(&["a"]), ttl::CATEGORIES);
        assert!(cache.get("categories_list").is_some());
    }
}
