//! Currency units, exchange rate and precision-safe arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default number of decimals kept for stored amounts.
pub const DEFAULT_DECIMALS: u32 = 6;

/// The two denominations of the game economy. Chaos is the minor unit,
/// divine the major one; an exchange rate relates the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Chaos,
    Divine,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Chaos => "chaos",
            Unit::Divine => "divine",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown currency unit '{0}', expected 'chaos' or 'divine'")]
pub struct ParseUnitError(String);

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chaos" | "c" => Ok(Unit::Chaos),
            "divine" | "div" | "d" => Ok(Unit::Divine),
            other => Err(ParseUnitError(other.to_string())),
        }
    }
}

/// A validated exchange rate: chaos per divine, finite and strictly
/// positive. Construction is the only place validation happens; conversion
/// over a `Rate` is infallible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate(f64);

#[derive(Debug, Error, PartialEq)]
#[error("exchange rate must be a positive finite number, got {0}")]
pub struct RateError(pub f64);

impl Rate {
    pub fn new(chaos_per_divine: f64) -> Result<Self, RateError> {
        if chaos_per_divine.is_finite() && chaos_per_divine > 0.0 {
            Ok(Rate(chaos_per_divine))
        } else {
            Err(RateError(chaos_per_divine))
        }
    }

    pub fn chaos_per_divine(self) -> f64 {
        self.0
    }
}

/// Converts an amount between the two denominations. Same-unit conversion
/// returns the amount unchanged.
pub fn convert(amount: f64, from: Unit, to: Unit, rate: Rate) -> f64 {
    match (from, to) {
        (Unit::Divine, Unit::Chaos) => amount * rate.chaos_per_divine(),
        (Unit::Chaos, Unit::Divine) => amount / rate.chaos_per_divine(),
        _ => amount,
    }
}

/// Normalizes an amount to the minor unit.
pub fn to_chaos(amount: f64, unit: Unit, rate: Rate) -> f64 {
    convert(amount, unit, Unit::Chaos, rate)
}

/// Rounds to `decimals` places, compensating for binary floating-point
/// representation error. Non-finite input (and scaled overflow) rounds to
/// `0.0`; this function never panics.
pub fn precise_round(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return 0.0;
    }
    // Nudge one epsilon away from zero so values sitting just below a half
    // boundary in binary representation round as written in decimal.
    let nudged = scaled * (1.0 + f64::EPSILON);
    nudged.round() / factor
}

/// Parses a decimal amount, accepting a decimal comma, and rounds it.
/// Returns `0.0` on anything unparseable; never panics.
pub fn safe_parse_float(text: &str, decimals: u32) -> f64 {
    let normalized = text.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => precise_round(value, decimals),
        _ => 0.0,
    }
}
