//! Import and export of all stored data as one JSON document.

use crate::core::settings::{FeatureToggles, StoredRate, UiPreferences};
use crate::core::trade::{TradeGroup, Transaction};
use crate::providers::caching::CachedRate;
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::warn;

use super::ui;

const EXPORT_VERSION: i64 = 1;

pub fn export(store: Arc<dyn KeyValue>, path: &str) -> Result<()> {
    let mut data = Map::new();
    for key in keys::ALL {
        match store.get(key) {
            Ok(Some(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    data.insert(key.to_string(), value);
                }
                Err(e) => warn!(key, error = %e, "Skipping unreadable document"),
            },
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "Skipping unreadable document"),
        }
    }

    let count = data.len();
    let doc = json!({
        "version": EXPORT_VERSION,
        "exportedAt": Utc::now(),
        "data": Value::Object(data),
    });
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("Failed to write export file to {path}"))?;

    println!("Exported {count} documents to {path}");
    Ok(())
}

pub fn import(store: Arc<dyn KeyValue>, path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file from {path}"))?;
    let doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("Import file is not valid JSON: {path}"))?;

    let version = doc.get("version").and_then(Value::as_i64).unwrap_or(0);
    if version != EXPORT_VERSION {
        bail!("Unsupported export version {version}, expected {EXPORT_VERSION}");
    }
    let data = doc
        .get("data")
        .and_then(Value::as_object)
        .context("Import file has no data object")?;

    let mut imported = 0usize;
    for (key, value) in data {
        let applied = match key.as_str() {
            keys::TRANSACTIONS => apply(
                &store,
                keys::TRANSACTIONS,
                value,
                Vec::<Transaction>::new(),
            )?,
            keys::COMPLETED_TRANSACTIONS => apply(
                &store,
                keys::COMPLETED_TRANSACTIONS,
                value,
                Vec::<Transaction>::new(),
            )?,
            keys::TRANSACTION_GROUPS => apply(
                &store,
                keys::TRANSACTION_GROUPS,
                value,
                Vec::<TradeGroup>::new(),
            )?,
            keys::SELECTED_LEAGUE => apply(&store, keys::SELECTED_LEAGUE, value, None::<String>)?,
            keys::EXCHANGE_RATE => apply(&store, keys::EXCHANGE_RATE, value, None::<StoredRate>)?,
            keys::RATE_CACHE => apply(&store, keys::RATE_CACHE, value, None::<CachedRate>)?,
            keys::FEATURE_TOGGLES => apply(
                &store,
                keys::FEATURE_TOGGLES,
                value,
                FeatureToggles::default(),
            )?,
            keys::UI_PREFERENCES => apply(
                &store,
                keys::UI_PREFERENCES,
                value,
                UiPreferences::default(),
            )?,
            other => {
                warn!(key = other, "Skipping unknown document");
                false
            }
        };
        if applied {
            imported += 1;
        }
    }

    println!("Imported {imported} documents from {path}");
    Ok(())
}

/// Validates one section against its schema and writes it through the slot,
/// so the usual write normalization applies to imported data too.
fn apply<T>(
    store: &Arc<dyn KeyValue>,
    key: &'static str,
    value: &Value,
    default: T,
) -> Result<bool>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let parsed: T = serde_json::from_value(value.clone())
        .with_context(|| format!("Malformed '{key}' section in import file"))?;
    let mut slot = StateSlot::load(Arc::clone(store), key, default);
    if let Err(e) = slot.update(move |_| parsed) {
        println!(
            "{}",
            ui::style_text(
                &format!("Imported '{key}' for this run only, storage failed: {e}"),
                ui::StyleType::Error
            )
        );
    }
    Ok(true)
}
