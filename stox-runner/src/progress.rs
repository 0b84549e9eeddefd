//! Progress reporting for long runs over many symbols.
//!
//! The runner is a batch tool; callers decide whether progress goes to
//! stdout, a UI, or nowhere. All methods default to no-ops.

use std::path::Path;

pub trait Progress {
    /// Called before a symbol's price sequence is simulated.
    fn on_symbol(&self, _symbol: &str, _index: usize, _total: usize, _trading_days: usize) {}

    /// Called after a batch of rows is appended to an output file.
    fn on_flush(&self, _rows: usize, _path: &Path) {}

    /// Non-fatal condition worth surfacing (skipped symbol, empty output).
    fn warn(&self, _message: &str) {}
}

/// Prints progress to stdout and warnings to stderr.
pub struct StdoutProgress;

impl Progress for StdoutProgress {
    fn on_symbol(&self, symbol: &str, index: usize, total: usize, trading_days: usize) {
        println!(
            "{symbol} \t[{} of {total}] \ttrading days: {trading_days}",
            index + 1
        );
    }

    fn on_flush(&self, rows: usize, path: &Path) {
        println!("Writing {rows} rows to {}", path.display());
    }

    fn warn(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }
}

/// Discards everything. Used in tests and by callers that report themselves.
pub struct SilentProgress;

impl Progress for SilentProgress {}
