//! Transaction ledger types and profit arithmetic.

use crate::core::currency::{self, Rate, Unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single flip: an item bought at one price and (eventually) sold at
/// another, each side in either denomination. Field names follow the
/// persisted document format, so exported data stays compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub item: String,
    pub buy_price: f64,
    pub buy_unit: Unit,
    pub buy_quantity: f64,
    pub sell_price: f64,
    pub sell_unit: Unit,
    pub sell_quantity: f64,
    pub league: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn buy_total_chaos(&self, rate: Rate) -> f64 {
        currency::to_chaos(self.buy_price, self.buy_unit, rate) * self.buy_quantity
    }

    pub fn sell_total_chaos(&self, rate: Rate) -> f64 {
        currency::to_chaos(self.sell_price, self.sell_unit, rate) * self.sell_quantity
    }

    pub fn profit_chaos(&self, rate: Rate) -> f64 {
        self.sell_total_chaos(rate) - self.buy_total_chaos(rate)
    }

    /// Profit relative to the invested amount. `None` when nothing was
    /// invested, rather than a division by zero.
    pub fn profit_percent(&self, rate: Rate) -> Option<f64> {
        let invested = self.buy_total_chaos(rate);
        if invested == 0.0 {
            None
        } else {
            Some(self.profit_chaos(rate) / invested * 100.0)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Allocates the next transaction id within a ledger.
pub fn next_id(transactions: &[Transaction]) -> u64 {
    transactions.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

/// A named bucket of transactions, e.g. one flipping strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeGroup {
    pub name: String,
    pub created_at: DateTime<Utc>,
}
