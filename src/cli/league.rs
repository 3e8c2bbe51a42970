use crate::config::AppConfig;
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::Result;
use std::sync::Arc;

use super::ui;

/// League every command operates on: the one selected at runtime, falling
/// back to the configured default.
pub(crate) fn selected_league(store: &Arc<dyn KeyValue>, config: &AppConfig) -> String {
    let slot = StateSlot::load(Arc::clone(store), keys::SELECTED_LEAGUE, None::<String>);
    slot.get().clone().unwrap_or_else(|| config.league.clone())
}

pub fn run(config: &AppConfig, store: Arc<dyn KeyValue>, name: Option<String>) -> Result<()> {
    match name {
        Some(name) => {
            let mut slot =
                StateSlot::load(Arc::clone(&store), keys::SELECTED_LEAGUE, None::<String>);
            let selected = name.clone();
            if let Err(e) = slot.update(move |_| Some(selected)) {
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Selection kept for this run only, storage failed: {e}"),
                        ui::StyleType::Error
                    )
                );
            }
            println!(
                "Selected league: {}",
                ui::style_text(&name, ui::StyleType::TotalLabel)
            );
        }
        None => {
            let selected = selected_league(&store, config);
            println!(
                "Current league: {}",
                ui::style_text(&selected, ui::StyleType::TotalLabel)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn config() -> AppConfig {
        serde_yaml::from_str(r#"league: "Standard""#).unwrap()
    }

    #[test]
    fn test_selected_league_falls_back_to_config() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        assert_eq!(selected_league(&store, &config()), "Standard");
    }

    #[test]
    fn test_selected_league_prefers_stored_selection() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        store.set(keys::SELECTED_LEAGUE, r#""Settlers""#).unwrap();
        assert_eq!(selected_league(&store, &config()), "Settlers");
    }

    #[test]
    fn test_run_persists_selection() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        run(&config(), Arc::clone(&store), Some("Affliction".to_string())).unwrap();
        assert_eq!(selected_league(&store, &config()), "Affliction");
    }
}
