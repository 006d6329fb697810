use alloy::primitives::U256;
use serde_json::{json, Value};

use super::calc;
use super::fixed::MANTISSA;
use super::MarketView;
use crate::errors::LensError;

/// Account-wide totals across markets, in quote units.
///
/// Supplied values are taken at the borrow side's scale (see [`MarketView::collateral_value`])
/// so every total compares with `amount x price` under either fixed-point policy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountSummary {
    pub total_supply_quote: U256,
    pub total_borrow_quote: U256,
    /// Sum over entered markets of supplied value times collateral factor.
    pub total_borrow_limit: U256,
    /// `total_borrow_quote / total_borrow_limit`; `None` without a limit.
    pub borrow_limit_usage: Option<f64>,
}

impl AccountSummary {
    pub fn from_markets<'a>(
        views: impl IntoIterator<Item = &'a MarketView>,
    ) -> Result<Self, LensError> {
        let mut s = Self::default();
        for v in views {
            let supplied = v.collateral_value();
            s.total_supply_quote = s
                .total_supply_quote
                .checked_add(supplied)
                .ok_or(LensError::FixedPointOverflow("total supply"))?;
            s.total_borrow_quote = s
                .total_borrow_quote
                .checked_add(v.borrow_balance_quote)
                .ok_or(LensError::FixedPointOverflow("total borrow"))?;
            if v.entered_as_collateral {
                let limit = supplied
                    .checked_mul(v.collateral_factor)
                    .ok_or(LensError::FixedPointOverflow("borrow limit"))?
                    / MANTISSA;
                s.total_borrow_limit = s
                    .total_borrow_limit
                    .checked_add(limit)
                    .ok_or(LensError::FixedPointOverflow("borrow limit"))?;
            }
        }
        s.borrow_limit_usage = calc::borrow_limit_usage(s.total_borrow_quote, s.total_borrow_limit);
        Ok(s)
    }

    pub fn remaining_capacity(&self) -> U256 {
        calc::remaining_borrow_capacity(self.total_borrow_limit, self.total_borrow_quote)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "total_supply_quote": self.total_supply_quote.to_string(),
            "total_borrow_quote": self.total_borrow_quote.to_string(),
            "total_borrow_limit": self.total_borrow_limit.to_string(),
            "remaining_capacity": self.remaining_capacity().to_string(),
            "borrow_limit_usage": self.borrow_limit_usage,
        })
    }
}
