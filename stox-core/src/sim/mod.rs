//! The rolling-window trade simulator.
//!
//! One simulator instance consumes one symbol's chronological price sequence.
//! Every price point enqueues a sized candidate purchase; once the window
//! holds a fully-aged oldest entry, each subsequent point also closes that
//! entry against itself, emitting exactly one completed trade per trading
//! day. Trades therefore overlap in time, approximating a
//! continuously-rolled fixed-holding-period strategy.

pub mod classify;
pub mod split;

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::domain::{CompletedTrade, PricePoint};

pub use classify::{size_buy, BuyClass, SizedBuy, PRICE_EPSILON};
pub use split::{is_split, shares_at_sale, SPLIT_EPSILON};

/// Simulation parameters shared by every symbol in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Fixed dollar budget for each daily purchase.
    pub budget_dollars: f64,
    /// Flat fee charged once per completed trade.
    pub tx_fee: f64,
    /// Trading days an entry ages before it is sold.
    pub hold_days: usize,
    /// Trades bought at or below this price are dropped from the output.
    pub low_price_cutoff: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("budget_dollars must be positive")]
    NonPositiveBudget,
    #[error("tx_fee must be non-negative")]
    NegativeFee,
    #[error("stock_hold_time must be at least 1 trading day")]
    ZeroHold,
    #[error("low_price_cutoff must be non-negative")]
    NegativeCutoff,
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.budget_dollars > 0.0) {
            return Err(ParamError::NonPositiveBudget);
        }
        if self.tx_fee < 0.0 {
            return Err(ParamError::NegativeFee);
        }
        if self.hold_days == 0 {
            return Err(ParamError::ZeroHold);
        }
        if self.low_price_cutoff < 0.0 {
            return Err(ParamError::NegativeCutoff);
        }
        Ok(())
    }
}

/// A queued candidate purchase, private to the simulator's window.
///
/// `sequence_index` is the zero-based position of the point within the
/// symbol's sequence — the window's ordering key, not a trade identifier.
#[derive(Debug, Clone)]
struct PendingEntry {
    sequence_index: usize,
    date: NaiveDate,
    shares_bought: f64,
    buy_price: f64,
    split_coefficient: f64,
}

/// Sliding-window state machine for one symbol.
///
/// Feed points in chronological order with [`step`](Self::step); each call
/// returns the trade closed on that day once the window has filled. Entries
/// still pending when the sequence ends are discarded unsold — call
/// [`finish`](Self::finish) to recover the symbol's diagnostics.
#[derive(Debug)]
pub struct TradeSimulator {
    symbol: String,
    params: SimParams,
    pending: VecDeque<PendingEntry>,
    sequence_index: usize,
    interval: u64,
    diagnostics: Diagnostics,
}

impl TradeSimulator {
    pub fn new(symbol: impl Into<String>, params: SimParams) -> Self {
        let hold = params.hold_days;
        Self {
            symbol: symbol.into(),
            params,
            // window never exceeds hold_days + 1 live entries
            pending: VecDeque::with_capacity(hold + 1),
            sequence_index: 0,
            interval: 1,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Live entries currently awaiting sale.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume one price point: enqueue a sized buy, and close the oldest
    /// entry against this point if the window has a fully-aged entry.
    pub fn step(&mut self, point: &PricePoint) -> Option<CompletedTrade> {
        let buy = size_buy(point, self.params.budget_dollars);
        match buy.class {
            BuyClass::PriceHigh => {
                self.diagnostics.cannot_afford.insert(self.symbol.clone());
            }
            BuyClass::PriceLow => {
                self.diagnostics.penny_stock.insert(self.symbol.clone());
            }
            BuyClass::Ok => {}
        }

        // Zero-share entries are enqueued too, so the window advances
        // uniformly and every day still closes exactly one trade.
        self.pending.push_back(PendingEntry {
            sequence_index: self.sequence_index,
            date: point.date,
            shares_bought: buy.shares,
            buy_price: buy.price,
            split_coefficient: point.split_coefficient,
        });

        let trade = if self.sequence_index >= self.params.hold_days {
            self.close_oldest(point)
        } else {
            None
        };

        self.sequence_index += 1;
        trade
    }

    /// Close the oldest pending entry against the current point.
    fn close_oldest(&mut self, point: &PricePoint) -> Option<CompletedTrade> {
        let oldest = self.pending.pop_front()?;

        // coefficients of entries strictly after the one being sold
        let shares_sold = shares_at_sale(
            oldest.shares_bought,
            self.pending.iter().map(|entry| entry.split_coefficient),
        );
        let trading_days_held = self.pending.len();

        let sell_price = point.mid();
        let gain_total = shares_sold * sell_price
            - oldest.shares_bought * oldest.buy_price
            - self.params.tx_fee;

        let trade = CompletedTrade {
            symbol: self.symbol.clone(),
            interval: self.interval,
            trading_days_held,
            cal_days_held: (point.date - oldest.date).num_days(),
            buy_date: oldest.date,
            shares_bought: oldest.shares_bought,
            buy_price: oldest.buy_price,
            sell_date: point.date,
            shares_sold,
            sell_price,
            fee: self.params.tx_fee,
            gain_total,
        };

        debug_assert_eq!(
            trade.trading_days_held,
            oldest.sequence_index.abs_diff(self.sequence_index)
        );
        self.interval += 1;
        Some(trade)
    }

    /// End of the symbol's sequence: pending entries are dropped unsold.
    pub fn finish(self) -> Diagnostics {
        self.diagnostics
    }

    /// Run a full price sequence through a fresh simulator.
    ///
    /// Convenience wrapper used by the runner: returns the emitted trades in
    /// order plus the symbol's diagnostics.
    pub fn run(
        symbol: &str,
        points: &[PricePoint],
        params: SimParams,
    ) -> (Vec<CompletedTrade>, Diagnostics) {
        let mut sim = TradeSimulator::new(symbol, params);
        let trades = points.iter().filter_map(|p| sim.step(p)).collect();
        (trades, sim.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(budget: f64, fee: f64, hold: usize) -> SimParams {
        SimParams {
            budget_dollars: budget,
            tx_fee: fee,
            hold_days: hold,
            low_price_cutoff: 0.0,
        }
    }

    fn point(day: u32, price: f64, split: f64) -> PricePoint {
        PricePoint {
            symbol: "X".into(),
            date: NaiveDate::from_ymd_opt(2018, 1, day).unwrap(),
            open: price,
            close: price,
            split_coefficient: split,
        }
    }

    fn flat_series(days: u32, price: f64) -> Vec<PricePoint> {
        (1..=days).map(|d| point(d, price, 1.0)).collect()
    }

    #[test]
    fn first_closure_matches_hand_computation() {
        // 5 days at 10, budget 100, fee 1, hold 2:
        // first closure on the third point, gain = 10*10 - 10*10 - 1 = -1
        let (trades, _) = TradeSimulator::run("X", &flat_series(5, 10.0), params(100.0, 1.0, 2));

        assert_eq!(trades.len(), 3);
        let first = &trades[0];
        assert_eq!(first.interval, 1);
        assert_eq!(first.shares_bought, 10.0);
        assert_eq!(first.buy_price, 10.0);
        assert_eq!(first.sell_price, 10.0);
        assert_eq!(first.trading_days_held, 2);
        assert_eq!(first.gain_total, -1.0);
    }

    #[test]
    fn one_trade_per_day_once_window_fills() {
        let (trades, _) = TradeSimulator::run("X", &flat_series(10, 10.0), params(100.0, 0.0, 3));
        // first 3 points only fill the window; every later point closes one
        assert_eq!(trades.len(), 7);
        let intervals: Vec<u64> = trades.iter().map(|t| t.interval).collect();
        assert_eq!(intervals, (1..=7).collect::<Vec<u64>>());
    }

    #[test]
    fn window_never_exceeds_hold_plus_one() {
        let mut sim = TradeSimulator::new("X", params(100.0, 0.0, 2));
        for p in flat_series(10, 10.0) {
            sim.step(&p);
            assert!(sim.pending_len() <= 3);
        }
    }

    #[test]
    fn tail_entries_are_discarded_unsold() {
        // 4 points, hold 2: entries from days 3 and 4 never close
        let (trades, _) = TradeSimulator::run("X", &flat_series(4, 10.0), params(100.0, 0.0, 2));
        assert_eq!(trades.len(), 2);
        assert_eq!(
            trades.last().unwrap().buy_date,
            NaiveDate::from_ymd_opt(2018, 1, 2).unwrap()
        );
    }

    #[test]
    fn short_sequence_emits_nothing() {
        let (trades, _) = TradeSimulator::run("X", &flat_series(2, 10.0), params(100.0, 0.0, 5));
        assert!(trades.is_empty());
    }

    #[test]
    fn split_inside_window_doubles_shares_sold() {
        // buy 10 at 10; a 2:1 split lands inside the window; sell at 10
        let points = vec![
            point(1, 10.0, 1.0),
            point(2, 10.0, 2.0),
            point(3, 10.0, 1.0),
        ];
        let (trades, _) = TradeSimulator::run("X", &points, params(100.0, 1.0, 2));

        let first = &trades[0];
        assert_eq!(first.shares_bought, 10.0);
        assert_eq!(first.shares_sold, 20.0);
        assert_eq!(first.gain_total, 20.0 * 10.0 - 10.0 * 10.0 - 1.0);
    }

    #[test]
    fn split_on_buy_day_does_not_affect_that_entry() {
        // the sold entry's own coefficient is excluded; only later entries count
        let points = vec![
            point(1, 10.0, 2.0),
            point(2, 10.0, 1.0),
            point(3, 10.0, 1.0),
        ];
        let (trades, _) = TradeSimulator::run("X", &points, params(100.0, 0.0, 2));
        assert_eq!(trades[0].shares_sold, 10.0);
    }

    #[test]
    fn split_then_reverse_within_window_nets_out() {
        let points = vec![
            point(1, 10.0, 1.0),
            point(2, 10.0, 2.0),
            point(3, 10.0, 0.5),
        ];
        let (trades, _) = TradeSimulator::run("X", &points, params(100.0, 0.0, 2));
        assert_eq!(trades[0].shares_sold, 10.0);
    }

    #[test]
    fn calendar_days_exceed_trading_days_over_weekends() {
        // Fri 2018-01-05, Mon 01-08, Tue 01-09: 2 trading days, 4 calendar days
        let points = vec![point(5, 10.0, 1.0), point(8, 10.0, 1.0), point(9, 10.0, 1.0)];
        let (trades, _) = TradeSimulator::run("X", &points, params(100.0, 0.0, 2));

        let first = &trades[0];
        assert_eq!(first.trading_days_held, 2);
        assert_eq!(first.cal_days_held, 4);
        assert!(first.cal_days_held >= first.trading_days_held as i64);
    }

    #[test]
    fn unaffordable_symbol_is_flagged_but_still_simulated() {
        let (trades, diags) =
            TradeSimulator::run("BKNG", &flat_series(5, 2000.0), params(100.0, 0.0, 2));

        assert!(diags.cannot_afford.contains("BKNG"));
        // zero-share trades are still emitted; the writer filters them
        assert_eq!(trades.len(), 3);
        assert!(trades.iter().all(|t| t.shares_bought == 0.0));
    }

    #[test]
    fn penny_symbol_is_flagged() {
        let (_, diags) =
            TradeSimulator::run("XELA", &flat_series(3, 0.00001), params(100.0, 0.0, 1));
        assert!(diags.penny_stock.contains("XELA"));
        assert!(diags.cannot_afford.is_empty());
    }

    #[test]
    fn rerun_is_deterministic() {
        let points = flat_series(30, 12.5);
        let (a, _) = TradeSimulator::run("X", &points, params(500.0, 2.0, 4));
        let (b, _) = TradeSimulator::run("X", &points, params(500.0, 2.0, 4));

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.interval, y.interval);
            assert_eq!(x.gain_total, y.gain_total);
        }
    }

    proptest! {
        #[test]
        fn shares_bought_is_exact_floor(
            price in 0.01f64..5000.0,
            budget in 1.0f64..100_000.0,
        ) {
            let p = point(1, price, 1.0);
            let buy = size_buy(&p, budget);
            prop_assert_eq!(buy.shares, (budget / p.mid()).floor());
        }

        #[test]
        fn emission_count_is_days_minus_hold(
            days in 1u32..28,
            hold in 1usize..10,
        ) {
            let (trades, _) =
                TradeSimulator::run("X", &flat_series(days, 10.0), params(100.0, 0.0, hold));
            let expected = (days as usize).saturating_sub(hold);
            prop_assert_eq!(trades.len(), expected);
        }

        #[test]
        fn trading_days_held_always_equals_hold(
            days in 5u32..28,
            hold in 1usize..5,
        ) {
            let (trades, _) =
                TradeSimulator::run("X", &flat_series(days, 10.0), params(100.0, 0.0, hold));
            for t in trades {
                prop_assert_eq!(t.trading_days_held, hold);
            }
        }
    }
}
