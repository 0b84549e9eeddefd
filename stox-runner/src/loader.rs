//! Price loading: CSV ingest, date filtering, and ordering validation.
//!
//! Input parse failures are fatal — the run produces no output rather than a
//! partial one. The loader also provides a deterministic synthetic price
//! generator for fixtures and smoke runs.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use stox_core::domain::PricePoint;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not parsed: {path}: {source}")]
    Parse { path: PathBuf, source: csv::Error },
    #[error("no price rows in {path} (after date filtering)")]
    Empty { path: PathBuf },
    #[error("duplicate trading day {date} for symbol '{symbol}'")]
    DuplicateDate { symbol: String, date: NaiveDate },
    #[error("bad price row for '{symbol}' on {date}: non-finite or negative values")]
    BadRow { symbol: String, date: NaiveDate },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One raw input row. Extra columns (high, low, volume, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawPriceRow {
    symbol: String,
    date: NaiveDate,
    open: f64,
    close: f64,
    split_coefficient: f64,
}

/// Load daily prices grouped by symbol, in sorted symbol order.
///
/// Rows outside the inclusive `[start, end]` window are dropped. Each
/// symbol's sequence is sorted by date and must end up strictly increasing;
/// a duplicate trading day aborts the run.
pub fn load_prices(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<BTreeMap<String, Vec<PricePoint>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut by_symbol: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for row in reader.deserialize::<RawPriceRow>() {
        let row = row.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if start.is_some_and(|s| row.date < s) || end.is_some_and(|e| row.date > e) {
            continue;
        }

        let point = PricePoint {
            symbol: row.symbol,
            date: row.date,
            open: row.open,
            close: row.close,
            split_coefficient: row.split_coefficient,
        };
        if !point.is_sane() {
            return Err(LoadError::BadRow {
                symbol: point.symbol,
                date: point.date,
            });
        }
        by_symbol.entry(point.symbol.clone()).or_default().push(point);
    }

    if by_symbol.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    for (symbol, points) in &mut by_symbol {
        points.sort_by_key(|p| p.date);
        for pair in points.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(LoadError::DuplicateDate {
                    symbol: symbol.clone(),
                    date: pair[0].date,
                });
            }
        }
    }

    Ok(by_symbol)
}

/// Generate a deterministic synthetic daily series for one symbol.
///
/// A random walk from 100.0 seeded from the symbol name, weekends skipped,
/// with occasional 2:1 splits and 1:2 reverse splits so the split engine
/// gets exercised. Same symbol and window → identical series.
pub fn synthetic_prices(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);

        let split_coefficient = if rng.gen_bool(0.01) {
            if rng.gen_bool(0.5) {
                2.0
            } else {
                0.5
            }
        } else {
            1.0
        };

        points.push(PricePoint {
            symbol: symbol.to_string(),
            date: current,
            open,
            close,
            split_coefficient,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    points
}

/// Write price points as a loader-compatible CSV.
pub fn write_prices_csv(path: &Path, points: &[PricePoint]) -> Result<(), LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut out = std::io::BufWriter::new(file);
    writeln!(out, "symbol,date,open,close,split_coefficient").map_err(io_err)?;
    for p in points {
        writeln!(
            out,
            "{},{},{:.4},{:.4},{}",
            p.symbol, p.date, p.open, p.close, p.split_coefficient
        )
        .map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}
