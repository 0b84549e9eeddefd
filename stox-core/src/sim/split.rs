//! Split compounding — adjust a share count across the holding window.
//!
//! Split coefficients recorded on entries enqueued after the sold entry, up
//! to and including the sale day, are applied multiplicatively in enqueue
//! order. A 2:1 split followed by a 1:2 reverse split nets out to exactly
//! the original share count.

/// Coefficients within this distance of 1.0 are treated as "no split".
/// Small real adjustments like 1.05 still count as splits.
pub const SPLIT_EPSILON: f64 = 1e-6;

/// Whether a recorded coefficient represents an actual split event.
pub fn is_split(coefficient: f64) -> bool {
    (coefficient - 1.0).abs() > SPLIT_EPSILON
}

/// Shares owned at the sale, starting from `shares_bought` and compounding
/// every split coefficient recorded after the sold entry.
///
/// `later_coefficients` must iterate in enqueue (chronological) order.
pub fn shares_at_sale<I>(shares_bought: f64, later_coefficients: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut shares_owned = shares_bought;
    for coefficient in later_coefficients {
        if is_split(coefficient) {
            shares_owned *= coefficient;
        }
    }
    shares_owned
}
