use crate::config::AppConfig;
use crate::core::currency::{self, DEFAULT_DECIMALS, Unit};
use crate::core::expr;
use crate::core::trade::{self, TradeGroup, Transaction};
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use super::ui;

#[derive(Debug, Clone)]
pub struct AddArgs {
    pub item: String,
    /// Buy price per unit; may be an arithmetic expression.
    pub buy: String,
    pub unit: Unit,
    pub quantity: String,
    /// Target sell price per unit, if already known.
    pub sell: Option<String>,
    pub sell_unit: Option<Unit>,
    pub group: Option<String>,
}

pub fn run(config: &AppConfig, store: Arc<dyn KeyValue>, args: AddArgs) -> Result<()> {
    let buy_price = expr::evaluate(&args.buy)
        .with_context(|| format!("Invalid buy price '{}'", args.buy))?;
    let buy_price = currency::precise_round(buy_price, DEFAULT_DECIMALS);
    if buy_price < 0.0 {
        bail!("Buy price cannot be negative");
    }

    let quantity = currency::safe_parse_float(&args.quantity, DEFAULT_DECIMALS);
    if quantity <= 0.0 {
        bail!("Quantity must be a positive number, got '{}'", args.quantity);
    }

    let sell_price = match &args.sell {
        Some(text) => {
            let value =
                expr::evaluate(text).with_context(|| format!("Invalid sell price '{text}'"))?;
            currency::precise_round(value, DEFAULT_DECIMALS)
        }
        None => 0.0,
    };

    let league = super::league::selected_league(&store, config);

    if let Some(group) = &args.group {
        register_group(&store, group);
    }

    let mut slot = StateSlot::load(
        Arc::clone(&store),
        keys::TRANSACTIONS,
        Vec::<Transaction>::new(),
    );
    let id = trade::next_id(slot.get());
    let txn = Transaction {
        id,
        item: args.item.clone(),
        buy_price,
        buy_unit: args.unit,
        buy_quantity: quantity,
        sell_price,
        sell_unit: args.sell_unit.unwrap_or(args.unit),
        sell_quantity: quantity,
        league,
        group: args.group.clone(),
        created_at: Utc::now(),
        completed_at: None,
    };

    if let Err(e) = slot.update(move |mut txns| {
        txns.push(txn);
        txns
    }) {
        println!(
            "{}",
            ui::style_text(
                &format!("Transaction kept for this run only, storage failed: {e}"),
                ui::StyleType::Error
            )
        );
    }

    println!(
        "Added #{id}: {} x {} @ {} {}",
        args.item, quantity, buy_price, args.unit
    );
    Ok(())
}

fn register_group(store: &Arc<dyn KeyValue>, name: &str) {
    let mut slot = StateSlot::load(
        Arc::clone(store),
        keys::TRANSACTION_GROUPS,
        Vec::<TradeGroup>::new(),
    );
    if slot.get().iter().any(|g| g.name == name) {
        return;
    }
    let group = TradeGroup {
        name: name.to_string(),
        created_at: Utc::now(),
    };
    if let Err(e) = slot.update(move |mut groups| {
        groups.push(group);
        groups
    }) {
        warn!("Failed to persist group registry: {e}");
    }
}
