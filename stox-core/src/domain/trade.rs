//! CompletedTrade — one closed buy/hold/sell round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed trade emitted by the simulator when a pending entry ages out
/// of the holding window.
///
/// `interval` is a 1-based, per-symbol counter assigned in emission order.
/// `shares_sold` can differ from `shares_bought` when split events fell
/// inside the holding window; reverse splits may leave it fractional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTrade {
    pub symbol: String,
    pub interval: u64,
    pub trading_days_held: usize,
    pub cal_days_held: i64,
    pub buy_date: NaiveDate,
    pub shares_bought: f64,
    pub buy_price: f64,
    pub sell_date: NaiveDate,
    pub shares_sold: f64,
    pub sell_price: f64,
    pub fee: f64,
    pub gain_total: f64,
}

impl CompletedTrade {
    pub fn is_winner(&self) -> bool {
        self.gain_total > 0.0
    }

    /// Dollar cost at entry, before the fee.
    pub fn cost(&self) -> f64 {
        self.shares_bought * self.buy_price
    }

    /// Dollar proceeds at exit.
    pub fn proceeds(&self) -> f64 {
        self.shares_sold * self.sell_price
    }
}
