use crate::market::{fixed::FixedPointPolicy, calc::RateConstants};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block time assumed by the rate calculator when a network does not override it.
pub const DEFAULT_BLOCK_TIME_SECONDS: f64 = 2.1_f64;
pub const DEFAULT_DAYS_PER_YEAR: u32 = 365;

/// MKR publishes `symbol()`/`name()` as `bytes32` instead of `string`.
pub const MKR_TOKEN: Address = address!("9f8f72aa9304c8b593d555f12ef6589cc3a579a2");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Seconds per block used to derive blocks-per-day.
    pub block_time_seconds: f64,
    /// Days per year for APY compounding.
    pub days_per_year: u32,
    /// How products of mantissa-scaled integers are rescaled.
    pub fixed_point: FixedPointPolicy,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            block_time_seconds: DEFAULT_BLOCK_TIME_SECONDS,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
            fixed_point: FixedPointPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    /// Native coin symbol, also the logo lookup key for the native market.
    pub native_symbol: String,
    pub native_name: String,
    /// Overrides `calculator.block_time_seconds` for this chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comptroller: Option<Address>,
    /// The market whose underlying is the native coin (it has no `underlying()`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_market: Option<Address>,
    /// Explicit market list. When empty, markets come from `getAllMarkets()`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markets: Vec<Address>,
}

/// A single network definition used by the table-driven [`LensConfig::default()`].
struct NetworkDef {
    name: &'static str,
    chain_id: u64,
    rpc_url: &'static str,
    native_symbol: &'static str,
    native_name: &'static str,
    comptroller: Option<Address>,
    native_market: Option<Address>,
}

const DEFAULT_NETWORKS: &[NetworkDef] = &[
    NetworkDef {
        name: "ethereum",
        chain_id: 1,
        rpc_url: "https://eth.llamarpc.com",
        native_symbol: "ETH",
        native_name: "Ether",
        // Compound v2 Unitroller and cETH.
        comptroller: Some(address!("3d9819210A31b4961b30EF54bE2aeD79B9c9Cd3B")),
        native_market: Some(address!("4Ddc2D193948926D02f9B1fE9e1daa0718270ED5")),
    },
    NetworkDef {
        name: "sepolia",
        chain_id: 11_155_111,
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        native_symbol: "ETH",
        native_name: "Sepolia Ether",
        comptroller: None,
        native_market: None,
    },
];

fn populate_networks(table: &[NetworkDef], out: &mut BTreeMap<String, NetworkConfig>) {
    for def in table {
        out.insert(
            def.name.into(),
            NetworkConfig {
                chain_id: def.chain_id,
                rpc_url: def.rpc_url.into(),
                native_symbol: def.native_symbol.into(),
                native_name: def.native_name.into(),
                block_time_seconds: None,
                comptroller: def.comptroller,
                native_market: def.native_market,
                markets: vec![],
            },
        );
    }
}

fn default_logos() -> BTreeMap<String, String> {
    const TRUSTWALLET: &str =
        "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/ethereum";
    [
        ("ETH", format!("{TRUSTWALLET}/info/logo.png")),
        (
            "MKR",
            format!("{TRUSTWALLET}/assets/0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2/logo.png"),
        ),
        (
            "DAI",
            format!("{TRUSTWALLET}/assets/0x6B175474E89094C44Da98b954EedeAC495271d0F/logo.png"),
        ),
        (
            "USDC",
            format!("{TRUSTWALLET}/assets/0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48/logo.png"),
        ),
        (
            "WBTC",
            format!("{TRUSTWALLET}/assets/0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599/logo.png"),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LensConfig {
    pub calculator: CalculatorConfig,
    /// Tokens whose `symbol()`/`name()` return `bytes32`.
    pub bytes32_metadata_tokens: Vec<Address>,
    /// Symbol -> logo URL.
    pub logos: BTreeMap<String, String>,
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for LensConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        populate_networks(DEFAULT_NETWORKS, &mut networks);
        Self {
            calculator: CalculatorConfig::default(),
            bytes32_metadata_tokens: vec![MKR_TOKEN],
            logos: default_logos(),
            networks,
        }
    }
}

impl LensConfig {
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, crate::errors::LensError> {
        self.networks
            .get(name.trim())
            .ok_or_else(|| crate::errors::LensError::UnknownChain(name.trim().to_owned()))
    }

    /// Check the calculator constants and every network's block-time override.
    pub fn validate(&self) -> Result<(), crate::errors::LensError> {
        use crate::errors::LensError;

        RateConstants {
            block_time_secs: self.calculator.block_time_seconds,
            days_per_year: self.calculator.days_per_year,
            ..RateConstants::default()
        }
        .validate()?;
        for (name, network) in &self.networks {
            self.rate_constants(network).validate().map_err(|e| match e {
                LensError::InvalidRateConstants(reason) => {
                    LensError::InvalidRateConstants(format!("{reason} (network {name})"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Rate constants for a network, honoring its block-time override.
    pub fn rate_constants(&self, network: &NetworkConfig) -> RateConstants {
        RateConstants {
            block_time_secs: network
                .block_time_seconds
                .unwrap_or(self.calculator.block_time_seconds),
            days_per_year: self.calculator.days_per_year,
            ..RateConstants::default()
        }
    }
}
