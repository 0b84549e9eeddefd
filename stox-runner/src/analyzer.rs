//! Per-symbol profitability statistics over a completed-trades file.
//!
//! One output row per symbol: trade counts, win rate, average return, and
//! the best and worst single trades with their buy/sell context. Batches are
//! sorted by win rate descending before they are appended.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use chrono::NaiveDate;
use stox_core::domain::CompletedTrade;

use crate::progress::Progress;
use crate::writer::FLUSH_THRESHOLD;

pub const ANALYSIS_HEADER: &str = "symbol,num_trades,pct_black,num_black,num_red,avg_return,\
avg_gain,avg_loss,max_gain,mg_buy_date,mg_buy_price,mg_sell_date,mg_sell_price,\
max_loss,ml_buy_date,ml_buy_price,ml_sell_date,ml_sell_price";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("not parsed: {path}: {source}")]
    Parse { path: PathBuf, source: csv::Error },
    #[error("no trades in {path}")]
    Empty { path: PathBuf },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counters for one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeSummary {
    /// Symbols with a stats row in the output.
    pub symbols: u64,
    /// Symbols skipped for lacking a winning or a losing trade.
    pub skipped: u64,
}

/// Statistics for one symbol's trades.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStats {
    pub symbol: String,
    pub num_trades: usize,
    /// Fraction of trades with positive gain, in `[0, 1]`.
    pub pct_black: f64,
    pub num_black: usize,
    pub num_red: usize,
    pub avg_return: f64,
    /// Mean gain over winning trades only.
    pub avg_gain: f64,
    /// Mean gain over losing trades only (negative).
    pub avg_loss: f64,
    pub max_gain: f64,
    pub mg_buy_date: NaiveDate,
    pub mg_buy_price: f64,
    pub mg_sell_date: NaiveDate,
    pub mg_sell_price: f64,
    pub max_loss: f64,
    pub ml_buy_date: NaiveDate,
    pub ml_buy_price: f64,
    pub ml_sell_date: NaiveDate,
    pub ml_sell_price: f64,
}

/// Compute the stats row for one symbol's trades.
///
/// Returns `None` when the symbol has no trades, no winner, or no loser —
/// the best/worst-trade columns would be undefined.
pub fn symbol_stats(symbol: &str, trades: &[CompletedTrade]) -> Option<SymbolStats> {
    if trades.is_empty() {
        return None;
    }

    let winners: Vec<&CompletedTrade> = trades.iter().filter(|t| t.gain_total > 0.0).collect();
    let losers: Vec<&CompletedTrade> = trades.iter().filter(|t| t.gain_total < 0.0).collect();
    if winners.is_empty() || losers.is_empty() {
        return None;
    }

    let best = winners
        .iter()
        .copied()
        .max_by(|a, b| a.gain_total.total_cmp(&b.gain_total))?;
    let worst = losers
        .iter()
        .copied()
        .min_by(|a, b| a.gain_total.total_cmp(&b.gain_total))?;

    let mean = |ts: &[&CompletedTrade]| {
        ts.iter().map(|t| t.gain_total).sum::<f64>() / ts.len() as f64
    };

    Some(SymbolStats {
        symbol: symbol.to_string(),
        num_trades: trades.len(),
        pct_black: winners.len() as f64 / trades.len() as f64,
        num_black: winners.len(),
        num_red: losers.len(),
        avg_return: trades.iter().map(|t| t.gain_total).sum::<f64>() / trades.len() as f64,
        avg_gain: mean(&winners),
        avg_loss: mean(&losers),
        max_gain: best.gain_total,
        mg_buy_date: best.buy_date,
        mg_buy_price: best.buy_price,
        mg_sell_date: best.sell_date,
        mg_sell_price: best.sell_price,
        max_loss: worst.gain_total,
        ml_buy_date: worst.buy_date,
        ml_buy_price: worst.buy_price,
        ml_sell_date: worst.sell_date,
        ml_sell_price: worst.sell_price,
    })
}

/// Read a completed-trades CSV, grouped by symbol in sorted order.
pub fn read_trades(path: &Path) -> Result<BTreeMap<String, Vec<CompletedTrade>>, AnalyzeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| AnalyzeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut by_symbol: BTreeMap<String, Vec<CompletedTrade>> = BTreeMap::new();
    for row in reader.deserialize::<CompletedTrade>() {
        let trade = row.map_err(|source| AnalyzeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        by_symbol.entry(trade.symbol.clone()).or_default().push(trade);
    }

    if by_symbol.is_empty() {
        return Err(AnalyzeError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(by_symbol)
}

/// Analyze a completed-trades file into a per-symbol stats CSV.
///
/// Stats rows are written in batches sorted by `pct_black` descending, with
/// the header only on the first batch. Symbols with fewer than `min_trades`
/// trades, or without both a winner and a loser, are skipped with a warning.
pub fn analyze_file(
    trades_path: &Path,
    analysis_path: &Path,
    min_trades: usize,
    progress: &dyn Progress,
) -> Result<AnalyzeSummary, AnalyzeError> {
    let by_symbol = read_trades(trades_path)?;

    match std::fs::remove_file(analysis_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(AnalyzeError::Io {
                path: analysis_path.to_path_buf(),
                source,
            })
        }
    }

    let mut summary = AnalyzeSummary::default();
    let mut batch: Vec<SymbolStats> = Vec::new();
    let mut header_written = false;

    for (symbol, trades) in &by_symbol {
        if trades.len() < min_trades {
            summary.skipped += 1;
            progress.warn(&format!(
                "dropped '{symbol}': {} trade(s), minimum is {min_trades}",
                trades.len()
            ));
            continue;
        }
        match symbol_stats(symbol, trades) {
            Some(stats) => {
                batch.push(stats);
                summary.symbols += 1;
            }
            None => {
                summary.skipped += 1;
                progress.warn(&format!(
                    "skipping '{symbol}': needs at least one winning and one losing trade"
                ));
                continue;
            }
        }
        if batch.len() >= FLUSH_THRESHOLD {
            append_analysis_csv(analysis_path, &mut batch, &mut header_written, progress)?;
        }
    }
    append_analysis_csv(analysis_path, &mut batch, &mut header_written, progress)?;
    Ok(summary)
}

fn append_analysis_csv(
    path: &Path,
    batch: &mut Vec<SymbolStats>,
    header_written: &mut bool,
    progress: &dyn Progress,
) -> Result<(), AnalyzeError> {
    if batch.is_empty() {
        return Ok(());
    }

    // highest win rate first, symbol order breaks ties
    batch.sort_by(|a, b| {
        b.pct_black
            .total_cmp(&a.pct_black)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let io_err = |source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = if *header_written {
        OpenOptions::new().append(true).open(path).map_err(io_err)?
    } else {
        File::create(path).map_err(io_err)?
    };
    let mut out = BufWriter::new(file);

    if !*header_written {
        writeln!(out, "{ANALYSIS_HEADER}").map_err(io_err)?;
        *header_written = true;
    }
    for s in batch.iter() {
        writeln!(
            out,
            "{},{},{:.3},{},{},{:.3},{:.3},{:.3},{:.3},{},{:.3},{},{:.3},{:.3},{},{:.3},{},{:.3}",
            s.symbol,
            s.num_trades,
            s.pct_black,
            s.num_black,
            s.num_red,
            s.avg_return,
            s.avg_gain,
            s.avg_loss,
            s.max_gain,
            s.mg_buy_date,
            s.mg_buy_price,
            s.mg_sell_date,
            s.mg_sell_price,
            s.max_loss,
            s.ml_buy_date,
            s.ml_buy_price,
            s.ml_sell_date,
            s.ml_sell_price,
        )
        .map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    progress.on_flush(batch.len(), path);
    batch.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;

    fn trade(symbol: &str, interval: u64, gain: f64) -> CompletedTrade {
        let day = interval as u32;
        CompletedTrade {
            symbol: symbol.into(),
            interval,
            trading_days_held: 2,
            cal_days_held: 2,
            buy_date: NaiveDate::from_ymd_opt(2018, 1, day).unwrap(),
            shares_bought: 10.0,
            buy_price: 10.0,
            sell_date: NaiveDate::from_ymd_opt(2018, 2, day).unwrap(),
            shares_sold: 10.0,
            sell_price: 10.0 + gain / 10.0,
            fee: 0.0,
            gain_total: gain,
        }
    }

    #[test]
    fn stats_over_mixed_trades() {
        let trades = vec![
            trade("AZO", 1, 10.0),
            trade("AZO", 2, -4.0),
            trade("AZO", 3, 30.0),
            trade("AZO", 4, -6.0),
        ];
        let stats = symbol_stats("AZO", &trades).unwrap();

        assert_eq!(stats.num_trades, 4);
        assert_eq!(stats.num_black, 2);
        assert_eq!(stats.num_red, 2);
        assert!((stats.pct_black - 0.5).abs() < 1e-12);
        assert!((stats.avg_return - 7.5).abs() < 1e-12);
        assert!((stats.avg_gain - 20.0).abs() < 1e-12);
        assert!((stats.avg_loss - -5.0).abs() < 1e-12);
        assert_eq!(stats.max_gain, 30.0);
        assert_eq!(stats.mg_buy_date, NaiveDate::from_ymd_opt(2018, 1, 3).unwrap());
        assert_eq!(stats.max_loss, -6.0);
        assert_eq!(stats.ml_buy_date, NaiveDate::from_ymd_opt(2018, 1, 4).unwrap());
    }

    #[test]
    fn all_winners_is_skipped() {
        let trades = vec![trade("AZO", 1, 5.0), trade("AZO", 2, 7.0)];
        assert!(symbol_stats("AZO", &trades).is_none());
    }

    #[test]
    fn all_losers_is_skipped() {
        let trades = vec![trade("AZO", 1, -5.0)];
        assert!(symbol_stats("AZO", &trades).is_none());
    }

    #[test]
    fn analysis_rows_sorted_by_win_rate() {
        let dir = tempfile::tempdir().unwrap();
        let trades_path = dir.path().join("trades.csv");
        let analysis_path = dir.path().join("analysis.csv");

        // LOW: 1 of 3 winners; HIGH: 2 of 3
        let mut writer = crate::writer::TradeWriter::create(&trades_path, 0.0).unwrap();
        writer
            .append_symbol(
                vec![trade("HIGH", 1, 5.0), trade("HIGH", 2, 5.0), trade("HIGH", 3, -1.0)],
                &SilentProgress,
            )
            .unwrap();
        writer
            .append_symbol(
                vec![trade("LOW", 1, 5.0), trade("LOW", 2, -5.0), trade("LOW", 3, -1.0)],
                &SilentProgress,
            )
            .unwrap();
        writer.finish(&SilentProgress).unwrap();

        let summary = analyze_file(&trades_path, &analysis_path, 1, &SilentProgress).unwrap();
        assert_eq!(summary.symbols, 2);
        assert_eq!(summary.skipped, 0);

        let content = std::fs::read_to_string(&analysis_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,num_trades,pct_black"));
        assert!(lines[1].starts_with("HIGH,3,0.667"));
        assert!(lines[2].starts_with("LOW,3,0.333"));
    }

    #[test]
    fn one_sided_symbols_are_counted_as_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let trades_path = dir.path().join("trades.csv");
        let analysis_path = dir.path().join("analysis.csv");

        let mut writer = crate::writer::TradeWriter::create(&trades_path, 0.0).unwrap();
        writer
            .append_symbol(
                vec![trade("MIX", 1, 5.0), trade("MIX", 2, -5.0)],
                &SilentProgress,
            )
            .unwrap();
        writer
            .append_symbol(vec![trade("UP", 1, 5.0)], &SilentProgress)
            .unwrap();
        writer.finish(&SilentProgress).unwrap();

        let summary = analyze_file(&trades_path, &analysis_path, 1, &SilentProgress).unwrap();
        assert_eq!(summary.symbols, 1);
        assert_eq!(summary.skipped, 1);

        let content = std::fs::read_to_string(&analysis_path).unwrap();
        assert!(content.contains("MIX"));
        assert!(!content.contains("UP"));
    }

    #[test]
    fn symbols_below_the_trade_minimum_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let trades_path = dir.path().join("trades.csv");
        let analysis_path = dir.path().join("analysis.csv");

        // THIN has 2 trades, DEEP has 4; a minimum of 3 keeps only DEEP
        let mut writer = crate::writer::TradeWriter::create(&trades_path, 0.0).unwrap();
        writer
            .append_symbol(
                vec![
                    trade("DEEP", 1, 5.0),
                    trade("DEEP", 2, -5.0),
                    trade("DEEP", 3, 2.0),
                    trade("DEEP", 4, -1.0),
                ],
                &SilentProgress,
            )
            .unwrap();
        writer
            .append_symbol(
                vec![trade("THIN", 1, 5.0), trade("THIN", 2, -5.0)],
                &SilentProgress,
            )
            .unwrap();
        writer.finish(&SilentProgress).unwrap();

        let summary = analyze_file(&trades_path, &analysis_path, 3, &SilentProgress).unwrap();
        assert_eq!(summary.symbols, 1);
        assert_eq!(summary.skipped, 1);

        let content = std::fs::read_to_string(&analysis_path).unwrap();
        assert!(content.contains("DEEP,4,"));
        assert!(!content.contains("THIN"));
    }

    #[test]
    fn missing_trades_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = analyze_file(
            &dir.path().join("nope.csv"),
            &dir.path().join("analysis.csv"),
            1,
            &SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzeError::Parse { .. }));
    }
}
