//! Run configuration, loaded from a TOML file.
//!
//! Dates are quoted `YYYY-MM-DD` strings so the same format works on the
//! command line and in the file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use stox_core::sim::{ParamError, SimParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("bad date '{value}' (expected YYYY-MM-DD)")]
    BadDate { value: String },
    #[error("invalid trade parameters: {0}")]
    Params(#[from] ParamError),
    #[error("[bench] requires non-empty hold_times and budgets")]
    EmptyBench,
}

/// Complete configuration for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    pub trade: TradeConfig,
    #[serde(default)]
    pub bench: Option<BenchConfig>,
}

/// File locations and the price window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Daily price CSV: symbol, date, open, close, split_coefficient.
    pub prices_file: PathBuf,
    /// Destination for completed trades.
    pub trades_file: PathBuf,
    /// Destination for per-symbol statistics.
    pub analysis_file: PathBuf,
    /// Inclusive start of the price window (YYYY-MM-DD). None = no bound.
    #[serde(default)]
    pub date_start: Option<String>,
    /// Inclusive end of the price window (YYYY-MM-DD). None = no bound.
    #[serde(default)]
    pub date_end: Option<String>,
    /// Rolling window for outlier cleaning. None disables cleaning.
    #[serde(default)]
    pub clean_window: Option<usize>,
    /// Symbols with fewer trades than this are dropped from the analysis.
    #[serde(default)]
    pub analyze_min_trades: Option<usize>,
}

/// The trading rule being simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfig {
    pub budget_dollars: f64,
    pub tx_fee: f64,
    /// Holding period in trading days.
    pub stock_hold_time: usize,
    /// Trades bought at or below this price are dropped from the output.
    pub low_price_cutoff: f64,
}

/// Benchmark sweep: one simulate + analyze pass per hold × budget pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    pub hold_times: Vec<usize>,
    pub budgets: Vec<f64>,
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trade.to_sim_params()?;
        self.data.date_window()?;
        if let Some(bench) = &self.bench {
            if bench.hold_times.is_empty() || bench.budgets.is_empty() {
                return Err(ConfigError::EmptyBench);
            }
        }
        Ok(())
    }

    /// Deterministic fingerprint of this configuration.
    ///
    /// Two runs with identical configs share a run id; combined with the
    /// replayable input this makes output files reproducible byte for byte.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

impl DataConfig {
    /// Parsed inclusive date bounds.
    pub fn date_window(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ConfigError> {
        Ok((
            parse_date(self.date_start.as_deref())?,
            parse_date(self.date_end.as_deref())?,
        ))
    }
}

impl TradeConfig {
    pub fn to_sim_params(&self) -> Result<SimParams, ParamError> {
        let params = SimParams {
            budget_dollars: self.budget_dollars,
            tx_fee: self.tx_fee,
            hold_days: self.stock_hold_time,
            low_price_cutoff: self.low_price_cutoff,
        };
        params.validate()?;
        Ok(params)
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, ConfigError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ConfigError::BadDate {
                value: s.to_string(),
            }),
    }
}
