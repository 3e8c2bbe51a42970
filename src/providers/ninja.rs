use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::providers::RateProvider;

/// The currency overview line carrying the major unit's price.
const MAJOR_CURRENCY_NAME: &str = "Divine Orb";

// NinjaRateProvider implementation for RateProvider
pub struct NinjaRateProvider {
    base_url: String,
}

impl NinjaRateProvider {
    pub fn new(base_url: &str) -> Self {
        NinjaRateProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CurrencyOverviewResponse {
    lines: Vec<CurrencyLine>,
}

#[derive(Deserialize, Debug)]
struct CurrencyLine {
    #[serde(alias = "currencyTypeName")]
    currency_type_name: String,
    #[serde(alias = "chaosEquivalent")]
    chaos_equivalent: Option<f64>,
}

#[async_trait]
impl RateProvider for NinjaRateProvider {
    #[instrument(
        name = "NinjaRateFetch",
        skip(self),
        fields(league = %league)
    )]
    async fn fetch_rate(&self, league: &str) -> Result<f64> {
        let url = format!(
            "{}/api/data/currencyoverview?league={}&type=Currency",
            self.base_url, league
        );
        debug!("Requesting currency overview from {}", url);

        let client = reqwest::Client::builder().user_agent("poeflip/0.2").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for league: {} URL: {}", e, league, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for league: {}",
                response.status(),
                league
            ));
        }

        let text = response.text().await?;

        let data: CurrencyOverviewResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", league, e))?;

        let line = data
            .lines
            .into_iter()
            .find(|line| line.currency_type_name == MAJOR_CURRENCY_NAME)
            .ok_or_else(|| anyhow!("No divine orb listing found for league: {}", league))?;

        let rate = line.chaos_equivalent.ok_or_else(|| {
            anyhow!(
                "Divine orb listing has no chaos equivalent for league: {}",
                league
            )
        })?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(anyhow!(
                "Feed returned an invalid rate {} for league: {}",
                rate,
                league
            ));
        }

        Ok(rate)
    }
}
