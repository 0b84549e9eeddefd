//! Stox CLI — fixed-holding-period backtests over daily price data.
//!
//! Commands:
//! - `run` — simulate the configured trading rule and analyze the results
//! - `bench` — sweep every hold-time × budget combination in `[bench]`
//! - `analyze` — re-run the per-symbol analysis over an existing trades file
//! - `synth` — generate a deterministic synthetic price CSV for smoke runs

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stox_runner::{analyze_file, run, run_sweep, RunConfig, StdoutProgress};

#[derive(Parser)]
#[command(name = "stox", about = "Fixed-holding-period trading-rule backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the configured trading rule and analyze the results.
    Run {
        /// Path to the TOML config file.
        #[arg(long, default_value = "stox.toml")]
        config: PathBuf,

        /// Override [trade] budget_dollars.
        #[arg(long)]
        budget: Option<f64>,

        /// Override [trade] tx_fee.
        #[arg(long)]
        fee: Option<f64>,

        /// Override [trade] stock_hold_time (trading days).
        #[arg(long)]
        hold: Option<usize>,

        /// Override [trade] low_price_cutoff.
        #[arg(long)]
        cutoff: Option<f64>,
    },
    /// Run every hold-time × budget combination in the config's [bench] section.
    Bench {
        /// Path to the TOML config file.
        #[arg(long, default_value = "stox.toml")]
        config: PathBuf,
    },
    /// Re-run the per-symbol analysis over an existing trades file.
    Analyze {
        /// Completed-trades CSV produced by `run`.
        #[arg(long)]
        trades: PathBuf,

        /// Destination for the per-symbol statistics CSV.
        #[arg(long)]
        output: PathBuf,

        /// Drop symbols with fewer trades than this.
        #[arg(long, default_value_t = 1)]
        min_trades: usize,
    },
    /// Generate a deterministic synthetic price CSV.
    Synth {
        /// Symbols to generate (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2015-01-02")]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2018-12-31")]
        end: String,

        /// Output CSV path.
        #[arg(long, default_value = "data/stock_prices.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            budget,
            fee,
            hold,
            cutoff,
        } => run_cmd(&config, budget, fee, hold, cutoff),
        Commands::Bench { config } => bench_cmd(&config),
        Commands::Analyze {
            trades,
            output,
            min_trades,
        } => analyze_cmd(&trades, &output, min_trades),
        Commands::Synth {
            symbols,
            start,
            end,
            output,
        } => synth_cmd(&symbols, &start, &end, &output),
    }
}

fn run_cmd(
    config_path: &PathBuf,
    budget: Option<f64>,
    fee: Option<f64>,
    hold: Option<usize>,
    cutoff: Option<f64>,
) -> Result<()> {
    let mut config = RunConfig::from_path(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(budget) = budget {
        config.trade.budget_dollars = budget;
    }
    if let Some(fee) = fee {
        config.trade.tx_fee = fee;
    }
    if let Some(hold) = hold {
        config.trade.stock_hold_time = hold;
    }
    if let Some(cutoff) = cutoff {
        config.trade.low_price_cutoff = cutoff;
    }

    let summary = run(&config, &StdoutProgress)?;

    println!();
    println!("run id:          {}", summary.run_id);
    println!("symbols:         {}", summary.symbols);
    println!("trades emitted:  {}", summary.trades_emitted);
    println!("trades written:  {}", summary.writes.rows_written);
    println!("trades filtered: {}", summary.writes.rows_filtered);
    match &summary.analysis {
        Some(analysis) => println!(
            "analysis:        {} symbol(s), {} skipped",
            analysis.symbols, analysis.skipped
        ),
        None => println!("analysis:        skipped (no surviving trades)"),
    }
    Ok(())
}

fn bench_cmd(config_path: &PathBuf) -> Result<()> {
    let config = RunConfig::from_path(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if config.bench.is_none() {
        bail!("config {} has no [bench] section", config_path.display());
    }

    let outcomes = run_sweep(&config, &StdoutProgress)?;

    println!();
    println!("hold\tbudget\ttrades\tfiles");
    for outcome in &outcomes {
        println!(
            "{}\t{}\t{}\t{}",
            outcome.hold_days,
            outcome.budget_dollars,
            outcome.summary.writes.rows_written,
            outcome.analysis_file.display()
        );
    }
    Ok(())
}

fn analyze_cmd(trades: &PathBuf, output: &PathBuf, min_trades: usize) -> Result<()> {
    let summary = analyze_file(trades, output, min_trades, &StdoutProgress)?;
    println!(
        "analyzed {} symbol(s) ({} skipped) into {}",
        summary.symbols,
        summary.skipped,
        output.display()
    );
    Ok(())
}

fn synth_cmd(symbols: &[String], start: &str, end: &str, output: &PathBuf) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("bad start date '{start}'"))?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .with_context(|| format!("bad end date '{end}'"))?;
    if end < start {
        bail!("end date precedes start date");
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut points = Vec::new();
    for symbol in symbols {
        points.extend(stox_runner::synthetic_prices(symbol, start, end));
    }
    stox_runner::write_prices_csv(output, &points)?;

    println!(
        "wrote {} price rows for {} symbol(s) to {}",
        points.len(),
        symbols.len(),
        output.display()
    );
    Ok(())
}
