//! Buy classification — size a hypothetical whole-share purchase at one
//! price point.

use crate::domain::PricePoint;

/// Prices below this are treated as degenerate (near-zero) rather than
/// divided into the budget.
pub const PRICE_EPSILON: f64 = 1e-4;

/// Outcome of sizing a buy against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyClass {
    /// At least one whole share was affordable.
    Ok,
    /// The budget does not cover a single share.
    PriceHigh,
    /// The price is below [`PRICE_EPSILON`]; no shares are sized.
    PriceLow,
}

/// A sized buy: the observed price, the whole-share count, and its class.
#[derive(Debug, Clone, Copy)]
pub struct SizedBuy {
    pub price: f64,
    pub shares: f64,
    pub class: BuyClass,
}

/// Classify and size a buy at `point` with a fixed dollar budget.
///
/// Only whole shares are bought: `shares = floor(budget / mid)`. A
/// `PriceLow` point sizes zero shares without touching the budget at all,
/// so a zero price can never divide into it.
pub fn size_buy(point: &PricePoint, budget_dollars: f64) -> SizedBuy {
    let price = point.mid();

    if price < PRICE_EPSILON {
        return SizedBuy {
            price,
            shares: 0.0,
            class: BuyClass::PriceLow,
        };
    }

    let shares = (budget_dollars / price).floor();
    let class = if shares < 1.0 {
        BuyClass::PriceHigh
    } else {
        BuyClass::Ok
    };

    SizedBuy {
        price,
        shares,
        class,
    }
}
