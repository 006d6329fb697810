//! Per-market view-models and the logic that builds and interprets them.

pub mod actions;
pub mod activity;
pub mod aggregator;
pub mod calc;
pub mod checks;
pub mod fixed;
pub mod reader;
pub mod refresh;
pub mod resolver;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use fixed::FixedPointPolicy;

/// Result of an oracle lookup.
///
/// A failed lookup degrades to a zero price instead of failing the market, but stays
/// distinguishable from a genuine zero quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OraclePrice {
    Quoted(U256),
    Unavailable { reason: String },
}

impl OraclePrice {
    /// The price to compute with: the quote, or zero when the lookup failed.
    pub fn value(&self) -> U256 {
        match self {
            Self::Quoted(p) => *p,
            Self::Unavailable { .. } => U256::ZERO,
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// The token backing a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderlyingAsset {
    /// `None` for the chain's native coin.
    pub address: Option<Address>,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub logo: Option<String>,
    pub price: OraclePrice,
    pub wallet_balance: U256,
    /// Allowance granted by the caller to the market contract.
    pub allowance: U256,
}

impl UnderlyingAsset {
    pub const fn is_native(&self) -> bool {
        self.address.is_none()
    }
}

/// Protocol-wide inputs shared by every market in one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolContext {
    pub comptroller: Address,
    pub oracle: Address,
    /// Markets the caller has entered as collateral.
    pub entered_markets: BTreeSet<Address>,
}

impl ProtocolContext {
    pub fn is_entered(&self, market: Address) -> bool {
        self.entered_markets.contains(&market)
    }
}

/// Snapshot of one market as seen by one account.
///
/// Quote-denominated fields are token amounts multiplied by the underlying price under
/// `fixed_point`. APY fields carry `apy_decimals` implied decimal places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketView {
    pub market: Address,
    pub underlying_address: Option<Address>,
    pub symbol: String,
    pub logo: Option<String>,
    pub supply_apy: U256,
    pub borrow_apy: U256,
    pub apy_decimals: u8,
    pub underlying_allowance: U256,
    pub wallet_balance: U256,
    pub supply_balance_underlying: U256,
    pub supply_balance_quote: U256,
    pub market_total_supply_quote: U256,
    pub borrow_balance_underlying: U256,
    pub borrow_balance_quote: U256,
    pub market_total_borrow_underlying: U256,
    pub market_total_borrow_quote: U256,
    pub entered_as_collateral: bool,
    pub liquidity_underlying: U256,
    pub liquidity_quote: U256,
    pub underlying_price: OraclePrice,
    pub collateral_factor: U256,
    pub reward_speed: U256,
    pub decimals: u8,
    pub is_native: bool,
    pub fixed_point: FixedPointPolicy,
}

impl MarketView {
    /// Supplied value at the same scale as `borrow_balance_quote`.
    pub fn collateral_value(&self) -> U256 {
        self.fixed_point.collateral_value(self.supply_balance_quote)
    }

    pub fn to_json(&self) -> Value {
        let price_source = match &self.underlying_price {
            OraclePrice::Quoted(_) => json!({ "status": "quoted" }),
            OraclePrice::Unavailable { reason } => {
                json!({ "status": "unavailable", "reason": reason })
            }
        };
        json!({
            "market": format!("{:#x}", self.market),
            "underlying_address": self.underlying_address.map(|a| format!("{a:#x}")),
            "symbol": self.symbol,
            "logo": self.logo,
            "decimals": self.decimals,
            "is_native": self.is_native,
            "fixed_point": self.fixed_point.as_str(),
            "supply_apy": self.supply_apy.to_string(),
            "borrow_apy": self.borrow_apy.to_string(),
            "supply_apy_ui": crate::amount::format_base_to_ui(self.supply_apy, self.apy_decimals),
            "borrow_apy_ui": crate::amount::format_base_to_ui(self.borrow_apy, self.apy_decimals),
            "apy_decimals": self.apy_decimals,
            "underlying_allowance": self.underlying_allowance.to_string(),
            "wallet_balance": self.wallet_balance.to_string(),
            "supply_balance_underlying": self.supply_balance_underlying.to_string(),
            "supply_balance_quote": self.supply_balance_quote.to_string(),
            "market_total_supply_quote": self.market_total_supply_quote.to_string(),
            "borrow_balance_underlying": self.borrow_balance_underlying.to_string(),
            "borrow_balance_quote": self.borrow_balance_quote.to_string(),
            "market_total_borrow_underlying": self.market_total_borrow_underlying.to_string(),
            "market_total_borrow_quote": self.market_total_borrow_quote.to_string(),
            "entered_as_collateral": self.entered_as_collateral,
            "liquidity_underlying": self.liquidity_underlying.to_string(),
            "liquidity_quote": self.liquidity_quote.to_string(),
            "underlying_price": self.underlying_price.value().to_string(),
            "underlying_price_source": price_source,
            "collateral_factor": self.collateral_factor.to_string(),
            "reward_speed": self.reward_speed.to_string(),
        })
    }
}
