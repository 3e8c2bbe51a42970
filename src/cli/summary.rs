use crate::config::AppConfig;
use crate::core::currency::{self, Rate, Unit};
use crate::core::settings::{FeatureToggles, UiPreferences};
use crate::core::trade::Transaction;
use crate::providers::RateProvider;
use crate::store::{KeyValue, StateSlot, keys};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::rate::{RateSource, resolve_rate};
use super::ui;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct GroupTotal {
    pub cost: f64,
    pub profit: f64,
}

/// Cost and projected profit per group, in chaos. Ungrouped transactions
/// are collected under one bucket.
pub(crate) fn group_totals(
    transactions: &[Transaction],
    rate: Rate,
) -> BTreeMap<String, GroupTotal> {
    let mut totals: BTreeMap<String, GroupTotal> = BTreeMap::new();
    for txn in transactions {
        let name = txn
            .group
            .clone()
            .unwrap_or_else(|| "(ungrouped)".to_string());
        let entry = totals.entry(name).or_default();
        entry.cost += txn.buy_total_chaos(rate);
        entry.profit += txn.profit_chaos(rate);
    }
    totals
}

fn open_table(transactions: &[Transaction], rate: Rate, decimals: usize, compact: bool) -> Table {
    let mut table = ui::new_styled_table(compact);
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Item"),
        ui::header_cell("Qty"),
        ui::header_cell("Buy"),
        ui::header_cell("Target sell"),
        ui::header_cell("Cost (chaos)"),
        ui::header_cell("Profit (chaos)"),
        ui::header_cell("Profit (%)"),
    ]);

    for txn in transactions {
        let cost = txn.buy_total_chaos(rate);
        let profit = txn.profit_chaos(rate);
        let sell = (txn.sell_price != 0.0)
            .then(|| format!("{:.decimals$} {}", txn.sell_price, txn.sell_unit));

        table.add_row(vec![
            Cell::new(txn.id).set_alignment(CellAlignment::Right),
            Cell::new(&txn.item),
            Cell::new(txn.buy_quantity).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.decimals$} {}", txn.buy_price, txn.buy_unit))
                .set_alignment(CellAlignment::Right),
            ui::format_optional_cell(sell, |s| s),
            Cell::new(format!("{cost:.decimals$}")).set_alignment(CellAlignment::Right),
            ui::format_profit_cell(profit, |p| format!("{p:+.decimals$}")),
            ui::format_optional_cell(txn.profit_percent(rate), |p| format!("{p:+.1}%")),
        ]);
    }
    table
}

fn completed_table(
    transactions: &[Transaction],
    rate: Rate,
    decimals: usize,
    compact: bool,
) -> Table {
    let mut table = ui::new_styled_table(compact);
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Item"),
        ui::header_cell("Sold"),
        ui::header_cell("Profit (chaos)"),
        ui::header_cell("Completed"),
    ]);

    for txn in transactions {
        let profit = txn.profit_chaos(rate);
        let completed = txn
            .completed_at
            .map(|at| at.format("%Y-%m-%d").to_string());
        table.add_row(vec![
            Cell::new(txn.id).set_alignment(CellAlignment::Right),
            Cell::new(&txn.item),
            Cell::new(format!(
                "{} x {:.decimals$} {}",
                txn.sell_quantity, txn.sell_price, txn.sell_unit
            ))
            .set_alignment(CellAlignment::Right),
            ui::format_profit_cell(profit, |p| format!("{p:+.decimals$}")),
            ui::format_optional_cell(completed, |c| c),
        ]);
    }
    table
}

pub async fn run(
    config: &AppConfig,
    store: Arc<dyn KeyValue>,
    provider: &dyn RateProvider,
) -> Result<()> {
    let league = super::league::selected_league(&store, config);
    let toggles = *StateSlot::load(
        Arc::clone(&store),
        keys::FEATURE_TOGGLES,
        FeatureToggles::default(),
    )
    .get();
    let prefs = *StateSlot::load(
        Arc::clone(&store),
        keys::UI_PREFERENCES,
        UiPreferences::default(),
    )
    .get();

    let open: Vec<Transaction> = StateSlot::load(
        Arc::clone(&store),
        keys::TRANSACTIONS,
        Vec::<Transaction>::new(),
    )
    .get()
    .iter()
    .filter(|t| t.league == league)
    .cloned()
    .collect();

    let completed: Vec<Transaction> = if prefs.show_completed {
        StateSlot::load(
            Arc::clone(&store),
            keys::COMPLETED_TRANSACTIONS,
            Vec::<Transaction>::new(),
        )
        .get()
        .iter()
        .filter(|t| t.league == league)
        .cloned()
        .collect()
    } else {
        Vec::new()
    };

    if open.is_empty() && completed.is_empty() {
        println!("No transactions in {league}. Record one with `poeflip add`.");
        return Ok(());
    }

    let pb = toggles
        .auto_refresh_rate
        .then(|| ui::new_spinner("Fetching exchange rate..."));
    let resolved = resolve_rate(&store, provider, &league, toggles.auto_refresh_rate).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let (rate, source) = resolved?;

    let decimals = config.display_decimals as usize;
    let source_label = match source {
        RateSource::Feed => "live",
        RateSource::Stored => "stored",
    };
    println!(
        "League: {} (1 divine = {:.decimals$} chaos, {source_label})\n",
        ui::style_text(&league, ui::StyleType::Title),
        rate.chaos_per_divine(),
    );

    if !open.is_empty() {
        println!("{}", open_table(&open, rate, decimals, prefs.compact_tables));

        let total_cost: f64 = open.iter().map(|t| t.buy_total_chaos(rate)).sum();
        let total_profit: f64 = open.iter().map(|t| t.profit_chaos(rate)).sum();
        let profit_style = if total_profit >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        println!(
            "\nTotal invested: {} chaos",
            ui::style_text(&format!("{total_cost:.decimals$}"), ui::StyleType::TotalLabel)
        );
        println!(
            "Projected profit: {} chaos ({:+.2} divine)",
            ui::style_text(&format!("{total_profit:+.decimals$}"), profit_style),
            currency::convert(total_profit, Unit::Chaos, Unit::Divine, rate),
        );
    }

    if toggles.group_totals && open.iter().any(|t| t.group.is_some()) {
        ui::print_separator();
        println!("{}", ui::style_text("Group totals", ui::StyleType::Title));

        let mut table = ui::new_styled_table(prefs.compact_tables);
        table.set_header(vec![
            ui::header_cell("Group"),
            ui::header_cell("Cost (chaos)"),
            ui::header_cell("Profit (chaos)"),
        ]);
        for (name, totals) in group_totals(&open, rate) {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{:.decimals$}", totals.cost))
                    .set_alignment(CellAlignment::Right),
                ui::format_profit_cell(totals.profit, |p| format!("{p:+.decimals$}")),
            ]);
        }
        println!("{table}");
    }

    if prefs.show_completed && !completed.is_empty() {
        ui::print_separator();
        println!("{}", ui::style_text("Completed", ui::StyleType::Title));
        println!(
            "{}",
            completed_table(&completed, rate, decimals, prefs.compact_tables)
        );

        let realized: f64 = completed.iter().map(|t| t.profit_chaos(rate)).sum();
        let style = if realized >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        println!(
            "\nRealized profit: {} chaos",
            ui::style_text(&format!("{realized:+.decimals$}"), style)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn txn(id: u64, group: Option<&str>, buy: f64, sell: f64) -> Transaction {
        Transaction {
            id,
            item: format!("Item {id}"),
            buy_price: buy,
            buy_unit: Unit::Chaos,
            buy_quantity: 1.0,
            sell_price: sell,
            sell_unit: Unit::Chaos,
            sell_quantity: 1.0,
            league: "Standard".to_string(),
            group: group.map(str::to_string),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_group_totals_buckets_by_group() {
        let rate = Rate::new(180.0).unwrap();
        let txns = vec![
            txn(1, Some("bulk"), 10.0, 15.0),
            txn(2, Some("bulk"), 20.0, 25.0),
            txn(3, None, 5.0, 4.0),
        ];

        let totals = group_totals(&txns, rate);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["bulk"].cost, 30.0);
        assert_eq!(totals["bulk"].profit, 10.0);
        assert_eq!(totals["(ungrouped)"].profit, -1.0);
    }

    #[test]
    fn test_tables_render_all_rows() {
        let rate = Rate::new(180.0).unwrap();
        let txns = vec![txn(1, None, 10.0, 15.0), txn(2, None, 1.0, 0.0)];

        let rendered = open_table(&txns, rate, 2, false).to_string();
        assert!(rendered.contains("Item 1"));
        assert!(rendered.contains("Item 2"));
        // A zero sell price renders as not-yet-listed
        assert!(rendered.contains("N/A"));
    }
}
