//! Input checks and max-amount helpers for the borrow and repay forms.
//!
//! Amounts are UI decimal strings in the underlying token's units. Checks run in a fixed order
//! and report the first rejection.

use alloy::primitives::U256;

use super::calc;
use super::summary::AccountSummary;
use super::MarketView;
use crate::amount;
use crate::errors::AmountRejection;

/// Parse a form amount. `Ok(None)` for an empty field (nothing to check yet).
pub fn parse_amount(input: &str, decimals: u8) -> Result<Option<U256>, AmountRejection> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    let digits_only = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(AmountRejection::NotANumber);
    }
    let is_zero = whole.bytes().chain(frac.bytes()).all(|b| b == b'0');
    if negative || is_zero {
        return Err(AmountRejection::NotPositive);
    }
    if frac.len() > usize::from(decimals) {
        return Err(AmountRejection::TooPrecise { decimals });
    }
    amount::parse_ui_to_base(body, decimals)
        .map(Some)
        .map_err(|_e| AmountRejection::Overflow)
}

/// Validate a borrow amount against the account's borrow limit and the market's liquidity.
pub fn check_borrow(
    input: &str,
    market: &MarketView,
    summary: &AccountSummary,
) -> Result<Option<U256>, AmountRejection> {
    let Some(amount) = parse_amount(input, market.decimals)? else {
        return Ok(None);
    };
    let value = market
        .fixed_point
        .mul(amount, market.underlying_price.value(), "borrow value")
        .map_err(|_e| AmountRejection::Overflow)?;
    if value > summary.total_borrow_limit {
        return Err(AmountRejection::ExceedsBorrowLimit);
    }
    if amount > market.liquidity_underlying {
        return Err(AmountRejection::ExceedsLiquidity);
    }
    Ok(Some(amount))
}

/// Validate a repay amount. With `full_repay` the borrow-balance bound is skipped, since
/// interest accrues between reading the balance and mining the repayment.
pub fn check_repay(
    input: &str,
    market: &MarketView,
    full_repay: bool,
) -> Result<Option<U256>, AmountRejection> {
    let Some(amount) = parse_amount(input, market.decimals)? else {
        return Ok(None);
    };
    if !full_repay && amount > market.borrow_balance_underlying {
        return Err(AmountRejection::ExceedsBorrowBalance);
    }
    if amount > market.wallet_balance {
        return Err(AmountRejection::ExceedsWalletBalance);
    }
    Ok(Some(amount))
}

/// Suggested borrow: half of the smaller of remaining capacity and liquidity.
///
/// Without a usable price the capacity is unbounded, leaving liquidity as the only limit.
pub fn max_borrow(market: &MarketView, summary: &AccountSummary) -> U256 {
    let capacity = calc::capacity_in_underlying(
        summary.total_borrow_limit,
        summary.total_borrow_quote,
        market.underlying_price.value(),
        market.fixed_point,
    )
    .ok()
    .flatten();
    let bound = capacity.map_or(market.liquidity_underlying, |c| {
        c.min(market.liquidity_underlying)
    });
    bound / U256::from(2_u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxRepay {
    pub amount: U256,
    /// The wallet can cover the whole debt.
    pub is_full: bool,
}

pub fn max_repay(affordable: U256, owed: U256) -> MaxRepay {
    MaxRepay {
        amount: affordable.min(owed),
        is_full: affordable >= owed,
    }
}

/// Whether `amount` needs an `approve` before supply or repay.
pub fn needs_approval(market: &MarketView, amount: U256) -> bool {
    let allowance = market.underlying_allowance;
    allowance.is_zero() || allowance < amount
}
