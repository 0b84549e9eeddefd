//! Batched trade output with degenerate-trade filtering.
//!
//! Trades accumulate in memory and are appended to the output CSV in sorted
//! batches: the header is written once, each batch drops zero-share and
//! penny-priced buys, and the batch is sorted by `(symbol, interval)` before
//! it goes out. Trades are only handed over a whole symbol at a time and
//! symbols arrive in sorted order, so a batch never splits a symbol and the
//! final file is globally sorted.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use stox_core::domain::CompletedTrade;

use crate::progress::Progress;

/// Buffered trades that trigger a flush. One batch of this size is the only
/// simulator output held in memory at a time.
pub const FLUSH_THRESHOLD: usize = 100_000;

pub const TRADES_HEADER: &str = "symbol,interval,trading_days_held,cal_days_held,buy_date,\
shares_bought,buy_price,sell_date,shares_sold,sell_price,fee,gain_total";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counters reported once the writer is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_written: u64,
    /// Trades dropped by the zero-share / low-price filters.
    pub rows_filtered: u64,
    pub batches: u32,
}

/// Append-only, batch-sorted trade writer.
pub struct TradeWriter {
    path: PathBuf,
    low_price_cutoff: f64,
    flush_threshold: usize,
    buffer: Vec<CompletedTrade>,
    header_written: bool,
    summary: WriteSummary,
}

impl TradeWriter {
    /// Start a writer targeting `path`. Any previous output file is removed;
    /// nothing is created until the first flush.
    pub fn create(path: &Path, low_price_cutoff: f64) -> Result<Self, WriteError> {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(WriteError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            low_price_cutoff,
            flush_threshold: FLUSH_THRESHOLD,
            buffer: Vec::new(),
            header_written: false,
            summary: WriteSummary::default(),
        })
    }

    /// Override the flush threshold (tests exercise multi-batch runs with
    /// small thresholds).
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold.max(1);
        self
    }

    /// Hand over one finished symbol's trades. Flushes when the buffer
    /// reaches the threshold — only here, so batches never split a symbol.
    pub fn append_symbol(
        &mut self,
        trades: Vec<CompletedTrade>,
        progress: &dyn Progress,
    ) -> Result<(), WriteError> {
        self.buffer.extend(trades);
        if self.buffer.len() >= self.flush_threshold {
            self.flush(progress)?;
        }
        Ok(())
    }

    /// Flush the remainder and return the run counters. If no trade ever
    /// survived the filters, no file is created.
    pub fn finish(mut self, progress: &dyn Progress) -> Result<WriteSummary, WriteError> {
        if !self.buffer.is_empty() {
            self.flush(progress)?;
        }
        Ok(self.summary)
    }

    fn flush(&mut self, progress: &dyn Progress) -> Result<(), WriteError> {
        let drained = self.buffer.len();
        let mut batch: Vec<CompletedTrade> = self.buffer.drain(..).collect();
        let cutoff = self.low_price_cutoff;
        batch.retain(|t| t.shares_bought > 0.0 && t.buy_price > cutoff);
        self.summary.rows_filtered += (drained - batch.len()) as u64;

        if batch.is_empty() {
            return Ok(());
        }

        batch.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.interval.cmp(&b.interval)));

        let path = &self.path;
        let io_err = |source| WriteError::Io {
            path: path.clone(),
            source,
        };

        let file = if self.header_written {
            OpenOptions::new().append(true).open(path).map_err(io_err)?
        } else {
            File::create(path).map_err(io_err)?
        };
        let mut out = BufWriter::new(file);

        if !self.header_written {
            writeln!(out, "{TRADES_HEADER}").map_err(io_err)?;
            self.header_written = true;
        }
        for trade in &batch {
            writeln!(
                out,
                "{},{},{},{},{},{:.3},{:.3},{},{:.3},{:.3},{:.3},{:.3}",
                trade.symbol,
                trade.interval,
                trade.trading_days_held,
                trade.cal_days_held,
                trade.buy_date,
                trade.shares_bought,
                trade.buy_price,
                trade.sell_date,
                trade.shares_sold,
                trade.sell_price,
                trade.fee,
                trade.gain_total,
            )
            .map_err(io_err)?;
        }
        out.flush().map_err(io_err)?;

        progress.on_flush(batch.len(), &self.path);
        self.summary.rows_written += batch.len() as u64;
        self.summary.batches += 1;
        Ok(())
    }
}
