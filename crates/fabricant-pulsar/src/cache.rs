//! Per-asset TTL cache
//!
//! Entries older than their TTL are treated as absent and evicted on access.
//! Readers may pass a tighter maximum age than the TTL an entry was stored
//! with; see [`RiskCache::get_within`].

use crate::types::RiskMetrics;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Cached metrics plus the time they were fetched
#[derive(Clone, Debug)]
struct CacheEntry {
    metrics: RiskMetrics,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.is_older_than(now, self.ttl)
    }

    fn is_older_than(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) >= self.ttl.min(max_age)
    }
}

/// Cache introspection snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of live (unexpired) entries
    pub size: usize,
    /// Assets with live entries, sorted
    pub entries: Vec<String>,
    pub hits: u64,
    pub misses: u64,
}

/// Risk metrics cache keyed by asset identifier
pub struct RiskCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RiskCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Live entry for `asset`, or `None` on miss / expiry
    pub fn get(&self, asset: &str) -> Option<RiskMetrics> {
        self.lookup(asset, None)
    }

    /// Like [`RiskCache::get`], but entries older than `max_age` also count
    /// as expired even when their stored TTL is longer
    pub fn get_within(&self, asset: &str, max_age: Duration) -> Option<RiskMetrics> {
        self.lookup(asset, Some(max_age))
    }

    fn lookup(&self, asset: &str, max_age: Option<Duration>) -> Option<RiskMetrics> {
        let now = Instant::now();
        let stale = |entry: &CacheEntry| match max_age {
            Some(max_age) => entry.is_older_than(now, max_age),
            None => entry.is_expired(now),
        };
        let lookup = self
            .entries
            .get(asset)
            .map(|entry| (stale(entry.value()), entry.metrics.clone()));

        match lookup {
            Some((false, metrics)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(asset, "risk cache hit");
                Some(metrics)
            }
            Some((true, _)) => {
                self.entries.remove_if(asset, |_, entry| stale(entry));
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(asset, "risk cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(asset, "risk cache miss");
                None
            }
        }
    }

    /// Store metrics under their asset with the default TTL
    pub fn insert(&self, metrics: RiskMetrics) {
        self.insert_with_ttl(metrics, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, metrics: RiskMetrics, ttl: Duration) {
        let entry = CacheEntry {
            fetched_at: Instant::now(),
            ttl,
            metrics,
        };
        self.entries.insert(entry.metrics.asset.clone(), entry);
    }

    /// Drop every entry regardless of age
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut entries: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        entries.sort();

        CacheStats {
            size: entries.len(),
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = RiskCache::new(Duration::from_secs(60));
        cache.insert(RiskMetrics::unknown("A").with_risk_score(0.3));

        tokio::time::advance(Duration::from_secs(59)).await;
        let cached = cache.get("A").unwrap();
        assert_eq!(cached.risk_score, Some(0.3));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss() {
        let cache = RiskCache::new(Duration::from_secs(60));
        cache.insert(RiskMetrics::unknown("A"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get("A").is_none());

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_exclude_expired_entries() {
        let cache = RiskCache::new(Duration::from_secs(10));
        cache.insert(RiskMetrics::unknown("short"));
        cache.insert_with_ttl(RiskMetrics::unknown("long"), Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(20)).await;
        let stats = cache.stats();
        assert_eq!(stats.entries, vec!["long".to_string()]);
        assert_eq!(cache.purge_expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_tightens_stored_ttl() {
        let cache = RiskCache::new(Duration::from_secs(60));
        cache.insert(RiskMetrics::unknown("A"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(cache.get_within("A", Duration::from_secs(10)).is_some());
        assert!(cache.get_within("A", Duration::from_secs(5)).is_none());
        // The stale entry was evicted, not just skipped
        assert!(cache.get("A").is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_never_extends_stored_ttl() {
        let cache = RiskCache::new(Duration::from_secs(10));
        cache.insert(RiskMetrics::unknown("A"));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(cache.get_within("A", Duration::from_secs(600)).is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = RiskCache::new(Duration::from_secs(60));
        cache.insert(RiskMetrics::unknown("A"));
        cache.insert(RiskMetrics::unknown("B"));
        assert_eq!(cache.stats().size, 2);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert!(cache.get("A").is_none());
    }
}
