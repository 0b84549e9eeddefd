//! Run diagnostics — symbols that produced degenerate (zero-share) buys.
//!
//! Returned as a value alongside the trade stream so callers decide how to
//! report them; nothing here is global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Symbols flagged during simulation. Informational only — a flagged symbol
/// still runs through the full simulation; its zero-share trades are dropped
/// later by the output filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Symbols whose unit share price exceeded the budget at least once.
    pub cannot_afford: BTreeSet<String>,
    /// Symbols that traded below the near-zero price epsilon at least once.
    pub penny_stock: BTreeSet<String>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.cannot_afford.is_empty() && self.penny_stock.is_empty()
    }

    /// Fold another symbol's diagnostics into this run-wide accumulator.
    pub fn merge(&mut self, other: Diagnostics) {
        self.cannot_afford.extend(other.cannot_afford);
        self.penny_stock.extend(other.penny_stock);
    }
}
