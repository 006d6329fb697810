//! Float arithmetic for annualized yields and display ratios.
//!
//! All `cast_precision_loss` / `float_arithmetic` lint expects live here so that
//! the fixed-point code elsewhere stays integer-only.

#![expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "dedicated float-math module; casts and arithmetic are intentional"
)]

const SECONDS_PER_DAY: f64 = 86_400.0_f64;

/// Blocks produced per day for a given block time in seconds.
pub fn blocks_per_day(block_time_secs: f64) -> f64 {
    SECONDS_PER_DAY / block_time_secs
}

/// Compound a per-block rate into an annual yield fraction.
///
/// `rate_per_block` is the raw mantissa-scaled rate and `mantissa` its scale. The per-block rate
/// is first turned into a simple daily rate, which is then compounded `days_per_year - 1` times.
pub fn compound_yearly(
    rate_per_block: u128,
    mantissa: u128,
    block_time_secs: f64,
    days_per_year: u32,
) -> f64 {
    let daily = (rate_per_block as f64 / mantissa as f64) * blocks_per_day(block_time_secs);
    let periods = i32::try_from(days_per_year.saturating_sub(1)).unwrap_or(i32::MAX);
    (daily + 1.0_f64).powi(periods) - 1.0_f64
}

/// Format a non-negative fraction with exactly `places` decimal places.
///
/// Rust's fixed-precision formatting rounds the exact binary value, so the digits are stable for
/// a given input.
pub fn to_fixed(value: f64, places: usize) -> String {
    format!("{value:.places$}")
}

/// `numerator / denominator` as a float; `None` when the denominator is zero.
pub fn ratio(numerator: u128, denominator: u128) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}
