use alloy::primitives::{utils::parse_units, U256};

use super::fixed::{FixedPointPolicy, MANTISSA};
use crate::config::{DEFAULT_BLOCK_TIME_SECONDS, DEFAULT_DAYS_PER_YEAR};
use crate::errors::LensError;
use crate::rate_math;

/// Rates are fixed-point at `36 - decimals` places after annualizing.
const APY_SCALE_BASE: u8 = 36;

/// Conventions the rate calculator depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConstants {
    pub block_time_secs: f64,
    pub days_per_year: u32,
    pub mantissa: U256,
}

impl Default for RateConstants {
    fn default() -> Self {
        Self {
            block_time_secs: DEFAULT_BLOCK_TIME_SECONDS,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
            mantissa: MANTISSA,
        }
    }
}

impl RateConstants {
    /// Reject constants the compounding cannot use: a non-positive or non-finite block time,
    /// a zero-day year or a zero mantissa.
    pub fn validate(&self) -> Result<(), LensError> {
        check_block_time(self.block_time_secs)?;
        if self.days_per_year == 0 {
            return Err(LensError::InvalidRateConstants(
                "days per year must be > 0".to_owned(),
            ));
        }
        if self.mantissa.is_zero() {
            return Err(LensError::InvalidRateConstants(
                "mantissa must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

pub fn check_block_time(secs: f64) -> Result<f64, LensError> {
    if secs.is_finite() && secs > 0.0_f64 {
        Ok(secs)
    } else {
        Err(LensError::InvalidRateConstants(format!(
            "block time must be a positive number of seconds, got {secs}"
        )))
    }
}

/// Parse a block time in seconds, as given on the command line or in the environment.
pub fn parse_block_time(s: &str) -> Result<f64, LensError> {
    let secs = s.trim().parse::<f64>().map_err(|_e| {
        LensError::InvalidRateConstants(format!("block time is not a number: {s:?}"))
    })?;
    check_block_time(secs)
}

/// Decimal places of an APY computed for a token with `underlying_decimals`.
pub fn apy_decimals(underlying_decimals: u8) -> Result<u8, LensError> {
    APY_SCALE_BASE
        .checked_sub(underlying_decimals)
        .ok_or(LensError::UnsupportedDecimals(underlying_decimals))
}

/// Annualize a per-block rate.
///
/// The per-block rate becomes a simple daily rate (`rate x blocksPerDay`) that compounds
/// `days_per_year - 1` times. The yield is rounded to `36 - underlying_decimals` places and
/// returned as an integer at that precision.
pub fn annual_yield(
    rate_per_block: U256,
    underlying_decimals: u8,
    rates: &RateConstants,
) -> Result<U256, LensError> {
    let places = apy_decimals(underlying_decimals)?;
    rates.validate()?;
    if rate_per_block.is_zero() {
        return Ok(U256::ZERO);
    }
    let rate = u128::try_from(rate_per_block)
        .map_err(|_| LensError::RateOutOfRange(rate_per_block.to_string()))?;
    let mantissa = u128::try_from(rates.mantissa)
        .map_err(|_| LensError::RateOutOfRange(format!("mantissa {}", rates.mantissa)))?;

    let apy = rate_math::compound_yearly(rate, mantissa, rates.block_time_secs, rates.days_per_year);
    if !apy.is_finite() || apy < 0.0_f64 {
        return Err(LensError::RateOutOfRange(rate_per_block.to_string()));
    }

    let fixed = rate_math::to_fixed(apy, usize::from(places));
    let parsed = parse_units(&fixed, places)
        .map_err(|e| LensError::RateOutOfRange(format!("{fixed}: {e}")))?;
    // The guard above keeps the value non-negative, so the magnitude is the value.
    Ok(parsed.get_absolute())
}

/// Borrow limit left after current borrows, in quote units.
pub fn remaining_borrow_capacity(borrow_limit: U256, borrowed: U256) -> U256 {
    borrow_limit.saturating_sub(borrowed)
}

/// Remaining borrow capacity expressed in underlying token units.
///
/// `None` when the price is zero (no meaningful conversion).
pub fn capacity_in_underlying(
    borrow_limit: U256,
    borrowed: U256,
    price: U256,
    policy: FixedPointPolicy,
) -> Result<Option<U256>, LensError> {
    policy.div(
        remaining_borrow_capacity(borrow_limit, borrowed),
        price,
        "borrow capacity",
    )
}

/// Share of the borrow limit already used, as a fraction; `None` when there is no limit.
pub fn borrow_limit_usage(borrowed: U256, borrow_limit: U256) -> Option<f64> {
    if borrow_limit.is_zero() {
        return None;
    }
    // Scale both sides down together so the ratio survives the narrowing to u128.
    let shift = borrow_limit.bit_len().max(borrowed.bit_len()).saturating_sub(127);
    let num = u128::try_from(borrowed >> shift).ok()?;
    let den = u128::try_from(borrow_limit >> shift).ok()?;
    rate_math::ratio(num, den)
}
