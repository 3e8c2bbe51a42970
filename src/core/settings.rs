//! Persisted settings documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The exchange rate last confirmed from the feed. Conversions fall back to
/// this value when the feed is unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRate {
    pub chaos_per_divine: f64,
    pub league: String,
    pub fetched_at: DateTime<Utc>,
}

/// Optional behaviors, off by default unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureToggles {
    pub group_totals: bool,
    pub auto_refresh_rate: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles {
            group_totals: false,
            auto_refresh_rate: true,
        }
    }
}

/// Display preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPreferences {
    pub show_completed: bool,
    pub compact_tables: bool,
}
