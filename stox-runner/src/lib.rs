//! Stox Runner — everything around the core simulator.
//!
//! This crate builds on `stox-core` to provide:
//! - TOML run configuration with a deterministic fingerprint
//! - CSV price loading with date filtering and ordering validation
//! - Rolling-window outlier cleaning
//! - The batched, filtered, header-once trade writer
//! - Per-symbol profitability analysis
//! - The single-run entry point and the hold-time × budget benchmark sweep

pub mod analyzer;
pub mod clean;
pub mod config;
pub mod loader;
pub mod progress;
pub mod runner;
pub mod sweep;
pub mod writer;

pub use analyzer::{analyze_file, symbol_stats, AnalyzeError, AnalyzeSummary, SymbolStats};
pub use clean::clean_outliers;
pub use config::{ConfigError, RunConfig};
pub use loader::{load_prices, synthetic_prices, write_prices_csv, LoadError};
pub use progress::{Progress, SilentProgress, StdoutProgress};
pub use runner::{run, RunError, RunSummary};
pub use sweep::{run_sweep, SweepError, SweepOutcome};
pub use writer::{TradeWriter, WriteError, WriteSummary, FLUSH_THRESHOLD};
