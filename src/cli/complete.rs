use crate::config::AppConfig;
use crate::core::currency::{self, DEFAULT_DECIMALS, Rate, Unit};
use crate::core::expr;
use crate::core::settings::StoredRate;
use crate::core::trade::Transaction;
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::sync::Arc;

use super::ui;

#[derive(Debug, Clone)]
pub struct CompleteArgs {
    pub id: u64,
    /// Realized sell price per unit; may be an arithmetic expression.
    pub sell: String,
    pub unit: Option<Unit>,
    pub quantity: Option<String>,
}

pub fn run(config: &AppConfig, store: Arc<dyn KeyValue>, args: CompleteArgs) -> Result<()> {
    let sell_price = expr::evaluate(&args.sell)
        .with_context(|| format!("Invalid sell price '{}'", args.sell))?;
    let sell_price = currency::precise_round(sell_price, DEFAULT_DECIMALS);

    let mut open = StateSlot::load(
        Arc::clone(&store),
        keys::TRANSACTIONS,
        Vec::<Transaction>::new(),
    );
    let Some(txn) = open.get().iter().find(|t| t.id == args.id).cloned() else {
        bail!("No open transaction with id {}", args.id);
    };

    let mut done = txn;
    done.sell_price = sell_price;
    if let Some(unit) = args.unit {
        done.sell_unit = unit;
    }
    if let Some(qty) = &args.quantity {
        let quantity = currency::safe_parse_float(qty, DEFAULT_DECIMALS);
        if quantity <= 0.0 {
            bail!("Quantity must be a positive number, got '{qty}'");
        }
        done.sell_quantity = quantity;
    }
    done.completed_at = Some(Utc::now());

    let id = args.id;
    if let Err(e) = open.update(move |txns| txns.into_iter().filter(|t| t.id != id).collect()) {
        println!(
            "{}",
            ui::style_text(
                &format!("Change kept for this run only, storage failed: {e}"),
                ui::StyleType::Error
            )
        );
    }

    let mut completed = StateSlot::load(
        Arc::clone(&store),
        keys::COMPLETED_TRANSACTIONS,
        Vec::<Transaction>::new(),
    );
    let record = done.clone();
    if let Err(e) = completed.update(move |mut txns| {
        txns.push(record);
        txns
    }) {
        println!(
            "{}",
            ui::style_text(
                &format!("Change kept for this run only, storage failed: {e}"),
                ui::StyleType::Error
            )
        );
    }

    println!("Completed #{}: {}", done.id, done.item);

    // Realized profit, when a usable rate for the league is stored
    let rate_slot = StateSlot::load(Arc::clone(&store), keys::EXCHANGE_RATE, None::<StoredRate>);
    if let Some(entry) = rate_slot.get() {
        if entry.league == done.league {
            if let Ok(rate) = Rate::new(entry.chaos_per_divine) {
                let profit = done.profit_chaos(rate);
                let decimals = config.display_decimals as usize;
                let text = format!("{profit:+.decimals$} chaos");
                let style = if profit >= 0.0 {
                    ui::StyleType::TotalValue
                } else {
                    ui::StyleType::Error
                };
                println!("Realized profit: {}", ui::style_text(&text, style));
            }
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

    fn seed_open(store: &Arc<dyn KeyValue>) {
        let txn = Transaction {
            id: 1,
            item: "Mageblood".to_string(),
            buy_price: 2.0,
            buy_unit: Unit::Divine,
            buy_quantity: 1.0,
            sell_price: 0.0,
            sell_unit: Unit::Chaos,
            sell_quantity: 1.0,
            league: "Standard".to_string(),
            group: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        store
            .set(
                keys::TRANSACTIONS,
                &serde_json::to_string(&vec![txn]).unwrap(),
            )
            .unwrap();
    }

    fn slot_of(store: &Arc<dyn KeyValue>, key: &'static str) -> Vec<Transaction> {
        StateSlot::load(Arc::clone(store), key, Vec::new()).get().clone()
    }

    #[test]
    fn test_complete_moves_transaction_between_slots() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        seed_open(&store);

        run(
            &config(),
            Arc::clone(&store),
            CompleteArgs {
                id: 1,
                sell: "450".to_string(),
                unit: None,
                quantity: None,
            },
        )
        .unwrap();

        assert!(slot_of(&store, keys::TRANSACTIONS).is_empty());
        let completed = slot_of(&store, keys::COMPLETED_TRANSACTIONS);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].sell_price, 450.0);
        assert!(completed[0].is_completed());
    }

    #[test]
    fn test_complete_unknown_id_fails() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        seed_open(&store);

        let result = run(
            &config(),
            Arc::clone(&store),
            CompleteArgs {
                id: 99,
                sell: "450".to_string(),
                unit: None,
                quantity: None,
            },
        );
        assert!(result.is_err());
        assert_eq!(slot_of(&store, keys::TRANSACTIONS).len(), 1);
    }

    #[test]
    fn test_complete_with_expression_and_overrides() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        seed_open(&store);

        run(
            &config(),
            Arc::clone(&store),
            CompleteArgs {
                id: 1,
                sell: "(2 + 0.5) * 100".to_string(),
                unit: Some(Unit::Chaos),
                quantity: Some("0,5".to_string()),
            },
        )
        .unwrap();

        let completed = slot_of(&store, keys::COMPLETED_TRANSACTIONS);
        assert_eq!(completed[0].sell_price, 250.0);
        assert_eq!(completed[0].sell_quantity, 0.5);
    }
}
