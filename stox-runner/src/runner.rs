//! Single-run orchestration: load, clean, simulate, write, analyze.

use std::path::PathBuf;
use thiserror::Error;

use stox_core::sim::{ParamError, SimParams, TradeSimulator};
use stox_core::Diagnostics;

use crate::analyzer::{analyze_file, AnalyzeError, AnalyzeSummary};
use crate::clean::clean_outliers;
use crate::config::{ConfigError, RunConfig};
use crate::loader::{load_prices, LoadError};
use crate::progress::Progress;
use crate::writer::{TradeWriter, WriteError, WriteSummary};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
}

/// What one run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub symbols: usize,
    /// Trades the simulator emitted, before output filtering.
    pub trades_emitted: u64,
    pub writes: WriteSummary,
    pub diagnostics: Diagnostics,
    /// `None` when no trade survived the filters and there was nothing to
    /// analyze.
    pub analysis: Option<AnalyzeSummary>,
}

/// Run the configured simulation end to end.
///
/// Symbols are processed independently in sorted order; each one's trades go
/// to the writer as a unit. A run that filters away every trade produces no
/// output files and an empty summary rather than an error.
pub fn run(config: &RunConfig, progress: &dyn Progress) -> Result<RunSummary, RunError> {
    config.validate()?;
    let params: SimParams = config.trade.to_sim_params()?;
    let (start, end) = config.data.date_window()?;

    let prices = load_prices(&config.data.prices_file, start, end)?;
    let total = prices.len();

    let mut writer = TradeWriter::create(&config.data.trades_file, params.low_price_cutoff)?;
    let mut diagnostics = Diagnostics::default();
    let mut trades_emitted = 0u64;

    for (index, (symbol, points)) in prices.iter().enumerate() {
        let cleaned;
        let points: &[_] = match config.data.clean_window {
            Some(window) => {
                cleaned = clean_outliers(points, window);
                &cleaned
            }
            None => points,
        };
        progress.on_symbol(symbol, index, total, points.len());

        let (trades, diag) = TradeSimulator::run(symbol, points, params.clone());
        trades_emitted += trades.len() as u64;
        diagnostics.merge(diag);
        writer.append_symbol(trades, progress)?;
    }
    let writes = writer.finish(progress)?;

    report_diagnostics(&diagnostics, progress);

    let analysis = if writes.rows_written == 0 {
        progress.warn(&format!(
            "no trades survived filtering; skipping analysis of {}",
            config.data.trades_file.display()
        ));
        // no output files from this run: clear a stale analysis file too
        match std::fs::remove_file(&config.data.analysis_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(RunError::Analyze(AnalyzeError::Io {
                    path: config.data.analysis_file.clone(),
                    source,
                }))
            }
        }
        None
    } else {
        Some(analyze_file(
            &config.data.trades_file,
            &config.data.analysis_file,
            config.data.analyze_min_trades.unwrap_or(1),
            progress,
        )?)
    };

    Ok(RunSummary {
        run_id: config.run_id(),
        symbols: total,
        trades_emitted,
        writes,
        diagnostics,
        analysis,
    })
}

fn report_diagnostics(diagnostics: &Diagnostics, progress: &dyn Progress) {
    if !diagnostics.cannot_afford.is_empty() {
        progress.warn(&format!(
            "budget too small for {} symbol(s): {}",
            diagnostics.cannot_afford.len(),
            join(&diagnostics.cannot_afford)
        ));
    }
    if !diagnostics.penny_stock.is_empty() {
        progress.warn(&format!(
            "near-zero prices for {} symbol(s): {}",
            diagnostics.penny_stock.len(),
            join(&diagnostics.penny_stock)
        ));
    }
}

fn join(symbols: &std::collections::BTreeSet<String>) -> String {
    symbols.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Variant of a base path with `_{hold}_days_{budget}_dollars` before the
/// extension. Used by the benchmark sweep to keep each combination's output
/// apart.
pub fn suffixed_path(base: &std::path::Path, hold_days: usize, budget_dollars: f64) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    let name = format!("{stem}_{hold_days}_days_{}_dollars.{ext}", budget_dollars as u64);
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixed_path_keeps_directory_and_extension() {
        let base = std::path::Path::new("data/buy_sell_results.csv");
        let path = suffixed_path(base, 5, 2000.0);
        assert_eq!(
            path,
            std::path::Path::new("data/buy_sell_results_5_days_2000_dollars.csv")
        );
    }
}
