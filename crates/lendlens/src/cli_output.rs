//! Centralised helpers for CLI output: JSON on stdout, operator notes on stderr.

use eyre::Context as _;
use serde_json::Value;
use std::io::Write as _;

/// Write `value` as pretty JSON plus a newline to stdout.
pub fn print_json(value: &Value) -> eyre::Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize output")?;
    writeln!(std::io::stdout().lock(), "{s}").context("write stdout")
}

/// Note on stderr that some markets could not be read (the JSON still lists them).
pub fn print_failed_markets(failed: usize, total: usize) {
    if failed == 0 {
        return;
    }
    let mut stderr = std::io::stderr().lock();
    let _write = writeln!(
        stderr,
        "lendlens: {failed} of {total} markets could not be read; see \"failures\" in the output."
    );
}
