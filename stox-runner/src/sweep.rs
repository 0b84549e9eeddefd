//! Benchmark sweep: one full simulate + analyze pass per hold-time × budget
//! combination, each with its own pair of output files.

use thiserror::Error;

use crate::config::{ConfigError, RunConfig};
use crate::progress::Progress;
use crate::runner::{run, suffixed_path, RunError, RunSummary};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("config has no [bench] section")]
    NoBench,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("run (hold={hold_days}, budget={budget_dollars}) failed: {source}")]
    Run {
        hold_days: usize,
        budget_dollars: f64,
        source: RunError,
    },
}

/// One completed combination.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub hold_days: usize,
    pub budget_dollars: f64,
    pub trades_file: std::path::PathBuf,
    pub analysis_file: std::path::PathBuf,
    pub summary: RunSummary,
}

/// Run every hold-time × budget combination in the config's `[bench]`
/// section, in listed order. Each combination re-reads the prices file and
/// writes to `<stem>_{hold}_days_{budget}_dollars.csv` variants of the
/// configured output paths.
pub fn run_sweep(
    config: &RunConfig,
    progress: &dyn Progress,
) -> Result<Vec<SweepOutcome>, SweepError> {
    config.validate()?;
    let bench = config.bench.as_ref().ok_or(SweepError::NoBench)?;

    let mut outcomes = Vec::with_capacity(bench.hold_times.len() * bench.budgets.len());
    for &hold_days in &bench.hold_times {
        for &budget_dollars in &bench.budgets {
            let mut combo = config.clone();
            combo.trade.stock_hold_time = hold_days;
            combo.trade.budget_dollars = budget_dollars;
            combo.data.trades_file =
                suffixed_path(&config.data.trades_file, hold_days, budget_dollars);
            combo.data.analysis_file =
                suffixed_path(&config.data.analysis_file, hold_days, budget_dollars);

            let summary = run(&combo, progress).map_err(|source| SweepError::Run {
                hold_days,
                budget_dollars,
                source,
            })?;

            outcomes.push(SweepOutcome {
                hold_days,
                budget_dollars,
                trades_file: combo.data.trades_file,
                analysis_file: combo.data.analysis_file,
                summary,
            });
        }
    }
    Ok(outcomes)
}
