//! Risk oracle client
//!
//! Lookups go cache → in-flight table → transport. A miss on an asset that is
//! already being fetched joins the pending fetch instead of issuing another.
//! Fetches run as their own tasks, so a caller that gives up (timeout, drop)
//! never strands an in-flight entry.
//!
//! The `_with` variants take the caller's current [`RiskOracleConfig`] so TTL
//! and retry changes apply on the next lookup without rebuilding the client.

use crate::cache::{CacheStats, RiskCache};
use crate::config::RiskOracleConfig;
use crate::error::OracleError;
use crate::retry::RetryPolicy;
use crate::transport::{PlaceholderTransport, RiskTransport};
use crate::types::RiskMetrics;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type PendingFetch = Shared<BoxFuture<'static, Result<RiskMetrics, OracleError>>>;

/// TTL and retry budget for one lookup
#[derive(Clone, Debug)]
struct LookupSettings {
    ttl: Duration,
    retry: RetryPolicy,
}

impl From<&RiskOracleConfig> for LookupSettings {
    fn from(config: &RiskOracleConfig) -> Self {
        Self {
            ttl: config.cache_ttl(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// Cached, batched, fault-tolerant risk lookups
pub struct RiskOracle {
    transport: Arc<dyn RiskTransport>,
    cache: Arc<RiskCache>,
    in_flight: Arc<Mutex<HashMap<String, PendingFetch>>>,
    retry: RetryPolicy,
}

impl RiskOracle {
    /// Create a client owning a fresh cache
    pub fn new(transport: Arc<dyn RiskTransport>, config: &RiskOracleConfig) -> Self {
        Self {
            transport,
            cache: Arc::new(RiskCache::new(config.cache_ttl())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Client backed by [`PlaceholderTransport`]
    pub fn placeholder(config: &RiskOracleConfig) -> Self {
        Self::new(Arc::new(PlaceholderTransport), config)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn default_settings(&self) -> LookupSettings {
        LookupSettings {
            ttl: self.cache.default_ttl(),
            retry: self.retry.clone(),
        }
    }

    /// Metrics for one asset, served from cache while fresh
    pub async fn get_risk_metrics(&self, asset: &str) -> Result<RiskMetrics, OracleError> {
        self.lookup(asset, self.default_settings()).await
    }

    /// [`RiskOracle::get_risk_metrics`] under `config`'s TTL and retry budget
    pub async fn get_risk_metrics_with(
        &self,
        asset: &str,
        config: &RiskOracleConfig,
    ) -> Result<RiskMetrics, OracleError> {
        self.lookup(asset, config.into()).await
    }

    async fn lookup(
        &self,
        asset: &str,
        settings: LookupSettings,
    ) -> Result<RiskMetrics, OracleError> {
        if let Some(metrics) = self.cache.get_within(asset, settings.ttl) {
            return Ok(metrics);
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(asset) {
                Some(pending) => {
                    tracing::debug!(asset, "joining in-flight risk lookup");
                    pending.clone()
                }
                None => {
                    // A fetch may have completed between the cache check and the lock
                    if let Some(metrics) = self.cache.get_within(asset, settings.ttl) {
                        return Ok(metrics);
                    }
                    let pending = self.start_fetch(asset, settings);
                    in_flight.insert(asset.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Spawn the fetch for `asset`. Must be called with the in-flight lock
    /// held; the task takes the same lock to remove its entry, so removal
    /// always happens after insertion.
    fn start_fetch(&self, asset: &str, settings: LookupSettings) -> PendingFetch {
        let transport = self.transport.clone();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();
        let asset = asset.to_string();

        let task = tokio::spawn(async move {
            let LookupSettings { ttl, retry } = settings;
            let result = retry
                .run("fetch", || {
                    let transport = transport.clone();
                    let asset = asset.clone();
                    async move { transport.fetch(&asset).await }
                })
                .await
                .map(|mut metrics| {
                    metrics.asset = asset.clone();
                    cache.insert_with_ttl(metrics.clone(), ttl);
                    metrics
                });

            in_flight.lock().remove(&asset);
            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(OracleError::Transport(format!("risk lookup task failed: {}", e)))
            })
        })
        .boxed()
        .shared()
    }

    /// Metrics for several assets; misses go out in one batch call.
    ///
    /// Every requested asset appears in the result. Assets the gateway did
    /// not report map to [`RiskMetrics::unknown`] and are not cached.
    pub async fn get_batch_risk_metrics(
        &self,
        assets: &[String],
    ) -> Result<HashMap<String, RiskMetrics>, OracleError> {
        self.lookup_batch(assets, self.default_settings()).await
    }

    /// [`RiskOracle::get_batch_risk_metrics`] under `config`'s TTL and retry budget
    pub async fn get_batch_risk_metrics_with(
        &self,
        assets: &[String],
        config: &RiskOracleConfig,
    ) -> Result<HashMap<String, RiskMetrics>, OracleError> {
        self.lookup_batch(assets, config.into()).await
    }

    async fn lookup_batch(
        &self,
        assets: &[String],
        settings: LookupSettings,
    ) -> Result<HashMap<String, RiskMetrics>, OracleError> {
        let mut results = HashMap::with_capacity(assets.len());
        let mut misses: Vec<String> = Vec::new();

        for asset in assets {
            if results.contains_key(asset) || misses.contains(asset) {
                continue;
            }
            match self.cache.get_within(asset, settings.ttl) {
                Some(metrics) => {
                    results.insert(asset.clone(), metrics);
                }
                None => misses.push(asset.clone()),
            }
        }

        if misses.is_empty() {
            return Ok(results);
        }

        tracing::debug!(
            hits = results.len(),
            misses = misses.len(),
            "issuing batch risk lookup"
        );

        let mut fetched = settings
            .retry
            .run("fetch_batch", || self.transport.fetch_batch(&misses))
            .await?;

        for asset in misses {
            let metrics = match fetched.remove(&asset) {
                Some(mut metrics) => {
                    metrics.asset = asset.clone();
                    self.cache.insert_with_ttl(metrics.clone(), settings.ttl);
                    metrics
                }
                None => RiskMetrics::unknown(asset.as_str()),
            };
            results.insert(asset, metrics);
        }

        Ok(results)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of lookups currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}
