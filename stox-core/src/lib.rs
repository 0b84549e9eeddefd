//! Stox Core — rolling-window buy/hold/sell simulation over daily prices.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (price points, completed trades)
//! - The sliding-window trade simulator (one synthetic trade per trading day)
//! - Buy classification (affordable / too expensive / penny-priced)
//! - Split-coefficient compounding across the holding window
//! - Run diagnostics (which symbols were unaffordable or penny-priced)
//!
//! The crate does no I/O: it consumes one symbol's chronological price
//! sequence at a time and produces completed trades plus diagnostics.

pub mod diagnostics;
pub mod domain;
pub mod sim;

pub use diagnostics::Diagnostics;
pub use domain::{CompletedTrade, PricePoint};
pub use sim::{BuyClass, ParamError, SimParams, TradeSimulator};
