use crate::providers::RateProvider;
use crate::store::{KeyValue, keys};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The persisted rate-cache entry. Lives under [`keys::RATE_CACHE`] so the
/// cache survives runs, unlike an in-process map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRate {
    pub chaos_per_divine: f64,
    pub league: String,
    pub fetched_at: DateTime<Utc>,
}

// Caching decorator for RateProvider
pub struct CachingRateProvider<T: RateProvider> {
    inner: T,
    store: Arc<dyn KeyValue>,
    ttl: Duration,
}

impl<T: RateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, store: Arc<dyn KeyValue>, ttl: Duration) -> Self {
        Self { inner, store, ttl }
    }

    fn cached(&self, league: &str) -> Option<f64> {
        let text = self.store.get(keys::RATE_CACHE).ok()??;
        let entry: CachedRate = serde_json::from_str(&text).ok()?;
        if entry.league != league {
            return None;
        }
        if Utc::now() - entry.fetched_at > self.ttl {
            debug!("Cached rate expired for league: {league}");
            return None;
        }
        Some(entry.chaos_per_divine)
    }

    fn remember(&self, league: &str, rate: f64) {
        let entry = CachedRate {
            chaos_per_divine: rate,
            league: league.to_string(),
            fetched_at: Utc::now(),
        };
        match serde_json::to_string(&entry) {
            Ok(text) => {
                if let Err(e) = self.store.set(keys::RATE_CACHE, &text) {
                    debug!("Failed to persist rate cache: {e}");
                }
            }
            Err(e) => debug!("Failed to encode rate cache entry: {e}"),
        }
    }
}

#[async_trait]
impl<T: RateProvider + Send + Sync> RateProvider for CachingRateProvider<T> {
    async fn fetch_rate(&self, league: &str) -> Result<f64> {
        if let Some(rate) = self.cached(league) {
            debug!("Cache hit for rate: {}", league);
            return Ok(rate);
        }
        debug!("Cache miss for rate: {}", league);
        let rate = self.inner.fetch_rate(league).await?;
        self.remember(league, rate);
        Ok(rate)
    }
}
