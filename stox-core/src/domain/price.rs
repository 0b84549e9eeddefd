//! PricePoint — one daily record for a symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single trading day for one symbol.
///
/// `split_coefficient` is the multiplicative share adjustment recorded on
/// this date (1.0 = no split). Within one symbol's sequence, dates must be
/// strictly increasing; the loader enforces this before points reach the
/// simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub split_coefficient: f64,
}

impl PricePoint {
    /// Midpoint of open and close — the price every buy and sell executes at.
    pub fn mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    /// Basic sanity check: finite, non-negative prices and a positive
    /// split coefficient.
    pub fn is_sane(&self) -> bool {
        self.open.is_finite()
            && self.close.is_finite()
            && self.open >= 0.0
            && self.close >= 0.0
            && self.split_coefficient.is_finite()
            && self.split_coefficient > 0.0
    }
}
