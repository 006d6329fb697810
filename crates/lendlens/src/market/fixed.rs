use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::LensError;

/// On-chain fractional values are integers scaled by this mantissa.
pub const MANTISSA: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// How a product of two mantissa-scaled integers is rescaled.
///
/// `Raw` keeps the bare product, so every multiplication grows the scale; existing dashboards
/// display these values as-is. `Normalized` divides one mantissa back out after each product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FixedPointPolicy {
    #[default]
    Raw,
    Normalized,
}

impl FixedPointPolicy {
    pub fn mul(self, a: U256, b: U256, what: &'static str) -> Result<U256, LensError> {
        let product = a
            .checked_mul(b)
            .ok_or(LensError::FixedPointOverflow(what))?;
        Ok(match self {
            Self::Raw => product,
            Self::Normalized => product / MANTISSA,
        })
    }

    /// Inverse of [`Self::mul`] for a quote value: how many token units `value` buys at `price`.
    ///
    /// `None` when the price is zero.
    pub fn div(self, value: U256, price: U256, what: &'static str) -> Result<Option<U256>, LensError> {
        if price.is_zero() {
            return Ok(None);
        }
        let numerator = match self {
            Self::Raw => value,
            Self::Normalized => value
                .checked_mul(MANTISSA)
                .ok_or(LensError::FixedPointOverflow(what))?,
        };
        Ok(Some(numerator / price))
    }

    /// Rescale a supplied-balance value (collateral balance x exchange rate x price) to the
    /// scale of a single `amount x price` product, so it compares with borrowed values.
    ///
    /// Under `Raw` the exchange-rate product keeps its mantissa; `Normalized` already
    /// divided it out.
    pub fn collateral_value(self, supply_quote: U256) -> U256 {
        match self {
            Self::Raw => supply_quote / MANTISSA,
            Self::Normalized => supply_quote,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Normalized => "normalized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(whole: u64, hundredths: u64) -> U256 {
        U256::from(whole) * MANTISSA + U256::from(hundredths) * MANTISSA / U256::from(100_u64)
    }

    #[test]
    fn normalized_keeps_one_mantissa() -> eyre::Result<()> {
        let p = FixedPointPolicy::Normalized;
        let balance = scaled(1000, 0);
        let rate = scaled(1, 5);
        let price = scaled(2, 0);
        let underlying = p.mul(balance, rate, "supply")?;
        assert_eq!(underlying, scaled(1050, 0));
        assert_eq!(p.mul(underlying, price, "supply value")?, scaled(2100, 0));
        Ok(())
    }

    #[test]
    fn raw_keeps_the_bare_product() -> eyre::Result<()> {
        let p = FixedPointPolicy::Raw;
        let balance = scaled(1000, 0);
        let rate = scaled(1, 5);
        let underlying = p.mul(balance, rate, "supply")?;
        assert_eq!(underlying, scaled(1050, 0) * MANTISSA);
        Ok(())
    }

    #[test]
    fn overflow_is_reported() {
        let r = FixedPointPolicy::Raw.mul(U256::MAX, U256::from(2_u64), "liquidity");
        assert_eq!(r, Err(LensError::FixedPointOverflow("liquidity")));
    }

    #[test]
    fn collateral_value_matches_borrow_scale() -> eyre::Result<()> {
        // 50 cTokens (8 decimals) at an exchange rate of 2e26 is 1e18 underlying units.
        let ctokens = U256::from(5_000_000_000_u64);
        let rate = U256::from(2_u64) * U256::from(10_u64).pow(U256::from(26_u64));
        let price = scaled(2000, 0);
        for p in [FixedPointPolicy::Raw, FixedPointPolicy::Normalized] {
            let supplied = p.mul(p.mul(ctokens, rate, "s")?, price, "s")?;
            let borrowed = p.mul(MANTISSA, price, "b")?;
            assert_eq!(p.collateral_value(supplied), borrowed, "{}", p.as_str());
        }
        Ok(())
    }

    #[test]
    fn div_inverts_mul() -> eyre::Result<()> {
        for p in [FixedPointPolicy::Raw, FixedPointPolicy::Normalized] {
            let amount = scaled(7, 25);
            let price = scaled(3, 0);
            let value = p.mul(amount, price, "v")?;
            assert_eq!(p.div(value, price, "v")?, Some(amount), "{}", p.as_str());
            assert_eq!(p.div(value, U256::ZERO, "v")?, None);
        }
        Ok(())
    }
}
