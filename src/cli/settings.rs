use crate::core::settings::{FeatureToggles, UiPreferences};
use crate::store::{KeyValue, StateSlot, StoreError, keys};
use anyhow::{Result, bail};
use comfy_table::Cell;
use std::sync::Arc;

use super::ui;

#[derive(Debug, Clone, Default)]
pub struct SettingsArgs {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

const KNOWN_FLAGS: &str = "group-totals, auto-refresh-rate, show-completed, compact-tables";

pub fn run(store: Arc<dyn KeyValue>, args: SettingsArgs) -> Result<()> {
    let mut toggles = StateSlot::load(
        Arc::clone(&store),
        keys::FEATURE_TOGGLES,
        FeatureToggles::default(),
    );
    let mut prefs = StateSlot::load(
        Arc::clone(&store),
        keys::UI_PREFERENCES,
        UiPreferences::default(),
    );

    let changes = args
        .enable
        .iter()
        .map(|flag| (flag.as_str(), true))
        .chain(args.disable.iter().map(|flag| (flag.as_str(), false)));
    for (flag, value) in changes {
        let result = apply(flag, value, &mut toggles, &mut prefs)?;
        if let Err(e) = result {
            println!(
                "{}",
                ui::style_text(
                    &format!("Setting kept for this run only, storage failed: {e}"),
                    ui::StyleType::Error
                )
            );
        }
    }

    let mut table = ui::new_styled_table(prefs.get().compact_tables);
    table.set_header(vec![ui::header_cell("Setting"), ui::header_cell("Value")]);
    let rows = [
        ("group-totals", toggles.get().group_totals),
        ("auto-refresh-rate", toggles.get().auto_refresh_rate),
        ("show-completed", prefs.get().show_completed),
        ("compact-tables", prefs.get().compact_tables),
    ];
    for (name, value) in rows {
        let label = if value { "on" } else { "off" };
        table.add_row(vec![Cell::new(name), Cell::new(label)]);
    }
    println!("{table}");
    Ok(())
}

/// Outer error: the flag does not exist. Inner error: the flag was applied
/// in memory but could not be persisted.
fn apply(
    flag: &str,
    value: bool,
    toggles: &mut StateSlot<FeatureToggles>,
    prefs: &mut StateSlot<UiPreferences>,
) -> Result<Result<(), StoreError>> {
    let result = match flag {
        "group-totals" => toggles.update(move |mut t| {
            t.group_totals = value;
            t
        }),
        "auto-refresh-rate" => toggles.update(move |mut t| {
            t.auto_refresh_rate = value;
            t
        }),
        "show-completed" => prefs.update(move |mut p| {
            p.show_completed = value;
            p
        }),
        "compact-tables" => prefs.update(move |mut p| {
            p.compact_tables = value;
            p
        }),
        other => bail!("Unknown setting '{other}', expected one of: {KNOWN_FLAGS}"),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_enable_and_disable_flags() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        run(
            Arc::clone(&store),
            SettingsArgs {
                enable: vec!["group-totals".to_string(), "show-completed".to_string()],
                disable: vec!["auto-refresh-rate".to_string()],
            },
        )
        .unwrap();

        let toggles = StateSlot::load(
            Arc::clone(&store),
            keys::FEATURE_TOGGLES,
            FeatureToggles::default(),
        );
        assert!(toggles.get().group_totals);
        assert!(!toggles.get().auto_refresh_rate);

        let prefs = StateSlot::load(
            Arc::clone(&store),
            keys::UI_PREFERENCES,
            UiPreferences::default(),
        );
        assert!(prefs.get().show_completed);
        assert!(!prefs.get().compact_tables);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        let result = run(
            Arc::clone(&store),
            SettingsArgs {
                enable: vec!["turbo-mode".to_string()],
                disable: Vec::new(),
            },
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("turbo-mode"));
    }
}
