//! Community price feed providers

pub mod caching;
pub mod ninja;

use anyhow::Result;
use async_trait::async_trait;

pub use caching::CachingRateProvider;
pub use ninja::NinjaRateProvider;

/// Source of a league's exchange rate, in chaos per divine. How the rate is
/// obtained is the provider's business; consumers validate it at the point
/// of use.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self, league: &str) -> Result<f64>;
}
