use crate::config::AppConfig;
use crate::core::currency::Rate;
use crate::core::settings::StoredRate;
use crate::providers::RateProvider;
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use super::ui;

#[derive(Debug)]
pub(crate) enum RateSource {
    Feed,
    Stored,
}

/// Resolves the conversion rate for a league: the live feed when asked (and
/// available), otherwise the last-known-good stored value. A fetched rate is
/// validated before anything trusts it, and written back as the new
/// last-known-good value.
pub(crate) async fn resolve_rate(
    store: &Arc<dyn KeyValue>,
    provider: &dyn RateProvider,
    league: &str,
    fetch: bool,
) -> Result<(Rate, RateSource)> {
    let mut slot = StateSlot::load(Arc::clone(store), keys::EXCHANGE_RATE, None::<StoredRate>);

    if fetch {
        match provider.fetch_rate(league).await {
            Ok(fetched) => {
                let rate = Rate::new(fetched)
                    .map_err(|e| anyhow!("Price feed returned an unusable rate: {e}"))?;
                let entry = StoredRate {
                    chaos_per_divine: rate.chaos_per_divine(),
                    league: league.to_string(),
                    fetched_at: Utc::now(),
                };
                if let Err(e) = slot.update(move |_| Some(entry)) {
                    warn!("Failed to store exchange rate: {e}");
                }
                return Ok((rate, RateSource::Feed));
            }
            Err(e) => {
                warn!("Price feed unavailable, falling back to stored rate: {e:#}");
            }
        }
    }

    match slot.get() {
        Some(entry) if entry.league == league => {
            let rate = Rate::new(entry.chaos_per_divine).map_err(|e| {
                anyhow!("Stored exchange rate is invalid ({e}); run `poeflip rate --refresh`")
            })?;
            Ok((rate, RateSource::Stored))
        }
        _ => Err(anyhow!(
            "No exchange rate known for league '{league}'; run `poeflip rate --refresh`"
        )),
    }
}

pub async fn run(
    config: &AppConfig,
    store: Arc<dyn KeyValue>,
    provider: &dyn RateProvider,
    refresh: bool,
) -> Result<()> {
    let league = super::league::selected_league(&store, config);

    let slot = StateSlot::load(Arc::clone(&store), keys::EXCHANGE_RATE, None::<StoredRate>);
    let have_stored = matches!(slot.get(), Some(entry) if entry.league == league);
    let fetch = refresh || !have_stored;

    if refresh {
        // Drop the feed cache so a refresh really hits the feed
        if let Err(e) = store.remove(keys::RATE_CACHE) {
            debug!("Failed to clear rate cache: {e}");
        }
    }

    let pb = fetch.then(|| ui::new_spinner("Fetching exchange rate..."));
    let resolved = resolve_rate(&store, provider, &league, fetch).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let (rate, source) = resolved?;

    let decimals = config.display_decimals as usize;
    let rate_text = format!("{:.decimals$}", rate.chaos_per_divine());
    match source {
        RateSource::Feed => println!(
            "1 divine = {} chaos ({league})",
            ui::style_text(&rate_text, ui::StyleType::TotalValue),
        ),
        RateSource::Stored => {
            let age = StateSlot::load(Arc::clone(&store), keys::EXCHANGE_RATE, None::<StoredRate>)
                .get()
                .as_ref()
                .map(|entry| format_age(Utc::now() - entry.fetched_at))
                .unwrap_or_else(|| "unknown age".to_string());
            println!(
                "1 divine = {} chaos ({league}, stored {})",
                ui::style_text(&rate_text, ui::StyleType::TotalValue),
                ui::style_text(&age, ui::StyleType::Subtle),
            );
        }
    }
    Ok(())
}

fn format_age(age: Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}m ago", age.num_minutes().max(0))
    }
}
