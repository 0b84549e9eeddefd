//! Domain types shared across the simulator and its consumers.

pub mod price;
pub mod trade;

pub use price::PricePoint;
pub use trade::CompletedTrade;
