use alloy::primitives::{Address, U256};
use eyre::Context as _;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use super::reader::{ChainReader, MetadataEncoding};
use super::{OraclePrice, ProtocolContext, UnderlyingAsset};
use crate::config::{LensConfig, NetworkConfig};

/// Native coins always use 18 decimals.
pub const NATIVE_DECIMALS: u8 = 18;

/// Per-network knowledge the resolver needs beyond chain reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    pub native_symbol: String,
    pub native_name: String,
    pub bytes32_metadata_tokens: BTreeSet<Address>,
    pub logos: BTreeMap<String, String>,
}

impl AssetSettings {
    pub fn from_config(cfg: &LensConfig, network: &NetworkConfig) -> Self {
        Self {
            native_symbol: network.native_symbol.clone(),
            native_name: network.native_name.clone(),
            bytes32_metadata_tokens: cfg.bytes32_metadata_tokens.iter().copied().collect(),
            logos: cfg.logos.clone(),
        }
    }

    fn logo(&self, symbol: &str) -> Option<String> {
        self.logos.get(symbol).cloned()
    }

    fn encoding_for(&self, token: Address) -> MetadataEncoding {
        if self.bytes32_metadata_tokens.contains(&token) {
            MetadataEncoding::Bytes32
        } else {
            MetadataEncoding::String
        }
    }
}

/// Look up a market's underlying price, degrading to [`OraclePrice::Unavailable`] on failure.
pub async fn fetch_price<R: ChainReader>(
    reader: &R,
    ctx: &ProtocolContext,
    market: Address,
) -> OraclePrice {
    match reader.underlying_price(ctx.oracle, market).await {
        Ok(p) => OraclePrice::Quoted(p),
        Err(e) => {
            warn!(market = %market, oracle = %ctx.oracle, error = %format!("{e:#}"), "oracle price lookup failed; using zero price");
            OraclePrice::Unavailable {
                reason: format!("{e:#}"),
            }
        }
    }
}

/// Build the [`UnderlyingAsset`] for `market`.
///
/// `underlying` is `None` for the native-coin market. Any failed read except the oracle price
/// fails the whole resolution.
pub async fn resolve_underlying<R: ChainReader>(
    reader: &R,
    settings: &AssetSettings,
    ctx: &ProtocolContext,
    market: Address,
    underlying: Option<Address>,
    account: Address,
) -> eyre::Result<UnderlyingAsset> {
    match underlying {
        None => resolve_native(reader, settings, ctx, market, account).await,
        Some(token) => resolve_token(reader, settings, ctx, market, token, account).await,
    }
}

async fn resolve_native<R: ChainReader>(
    reader: &R,
    settings: &AssetSettings,
    ctx: &ProtocolContext,
    market: Address,
    account: Address,
) -> eyre::Result<UnderlyingAsset> {
    let (price, balance) = tokio::join!(
        fetch_price(reader, ctx, market),
        reader.native_balance(account)
    );
    let wallet_balance = balance.context("read native balance")?;
    Ok(UnderlyingAsset {
        address: None,
        symbol: settings.native_symbol.clone(),
        name: settings.native_name.clone(),
        decimals: NATIVE_DECIMALS,
        total_supply: U256::ZERO,
        logo: settings.logo(&settings.native_symbol),
        price,
        wallet_balance,
        allowance: U256::MAX,
    })
}

async fn resolve_token<R: ChainReader>(
    reader: &R,
    settings: &AssetSettings,
    ctx: &ProtocolContext,
    market: Address,
    token: Address,
    account: Address,
) -> eyre::Result<UnderlyingAsset> {
    let encoding = settings.encoding_for(token);
    let reads = async {
        tokio::try_join!(
            async {
                reader
                    .symbol(token, encoding)
                    .await
                    .with_context(|| format!("read symbol() of {token:#x}"))
            },
            async {
                reader
                    .name(token, encoding)
                    .await
                    .with_context(|| format!("read name() of {token:#x}"))
            },
            async {
                reader
                    .decimals(token)
                    .await
                    .with_context(|| format!("read decimals() of {token:#x}"))
            },
            async {
                reader
                    .total_supply(token)
                    .await
                    .with_context(|| format!("read totalSupply() of {token:#x}"))
            },
            async {
                reader
                    .balance_of(token, account)
                    .await
                    .with_context(|| format!("read balanceOf() of {token:#x}"))
            },
            async {
                reader
                    .allowance(token, account, market)
                    .await
                    .with_context(|| format!("read allowance() of {token:#x}"))
            },
        )
    };
    let (reads, price) = tokio::join!(reads, fetch_price(reader, ctx, market));
    let (symbol, name, decimals, total_supply, wallet_balance, allowance) = reads?;

    let logo = settings.logo(&symbol);
    Ok(UnderlyingAsset {
        address: Some(token),
        symbol,
        name,
        decimals,
        total_supply,
        logo,
        price,
        wallet_balance,
        allowance,
    })
}
