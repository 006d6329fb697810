use alloy::primitives::Address;
use eyre::Context as _;
use tracing::debug;

use super::calc::{self, RateConstants};
use super::fixed::FixedPointPolicy;
use super::reader::ChainReader;
use super::resolver::{resolve_underlying, AssetSettings};
use super::{MarketView, ProtocolContext};
use crate::errors::LensError;

/// Everything needed to aggregate one market for one account.
#[derive(Debug, Clone, Copy)]
pub struct MarketRequest<'a> {
    pub market: Address,
    pub is_native: bool,
    pub account: Address,
    pub ctx: &'a ProtocolContext,
    pub settings: &'a AssetSettings,
    pub rates: &'a RateConstants,
    pub policy: FixedPointPolicy,
}

/// Combine the underlying asset with the market's own reads into one [`MarketView`].
///
/// Reads that do not depend on each other are issued together. Any failure other than the oracle
/// price aborts this market.
pub async fn aggregate_market<R: ChainReader>(
    reader: &R,
    req: &MarketRequest<'_>,
) -> eyre::Result<MarketView> {
    let market = req.market;
    let underlying_address = if req.is_native {
        None
    } else {
        Some(
            reader
                .underlying(market)
                .await
                .with_context(|| format!("read underlying() of market {market:#x}"))?,
        )
    };

    let (
        asset,
        snapshot,
        market_supply,
        exchange_rate,
        total_borrows,
        collateral_factor,
        supply_rate,
        borrow_rate,
        cash,
        reward_speed,
    ) = tokio::try_join!(
        resolve_underlying(
            reader,
            req.settings,
            req.ctx,
            market,
            underlying_address,
            req.account
        ),
        async {
            reader
                .account_snapshot(market, req.account)
                .await
                .with_context(|| format!("read getAccountSnapshot() of market {market:#x}"))
        },
        async {
            reader
                .total_supply(market)
                .await
                .with_context(|| format!("read totalSupply() of market {market:#x}"))
        },
        async {
            reader
                .exchange_rate_stored(market)
                .await
                .with_context(|| format!("read exchangeRateStored() of market {market:#x}"))
        },
        async {
            reader
                .total_borrows(market)
                .await
                .with_context(|| format!("read totalBorrows() of market {market:#x}"))
        },
        async {
            reader
                .collateral_factor(req.ctx.comptroller, market)
                .await
                .with_context(|| format!("read markets() for market {market:#x}"))
        },
        async {
            reader
                .supply_rate_per_block(market)
                .await
                .with_context(|| format!("read supplyRatePerBlock() of market {market:#x}"))
        },
        async {
            reader
                .borrow_rate_per_block(market)
                .await
                .with_context(|| format!("read borrowRatePerBlock() of market {market:#x}"))
        },
        async {
            reader
                .cash(market)
                .await
                .with_context(|| format!("read getCash() of market {market:#x}"))
        },
        async {
            reader
                .reward_speed(req.ctx.comptroller, market)
                .await
                .with_context(|| format!("read compSpeeds() for market {market:#x}"))
        },
    )?;

    if !snapshot.error.is_zero() {
        return Err(LensError::SnapshotError {
            market,
            code: snapshot.error.to_string(),
        }
        .into());
    }

    let policy = req.policy;
    let price = asset.price.value();
    let decimals = asset.decimals;

    let supply_balance_underlying =
        policy.mul(snapshot.collateral_balance, snapshot.exchange_rate, "supplied balance")?;
    let supply_balance_quote = policy.mul(supply_balance_underlying, price, "supplied value")?;
    let borrow_balance_underlying = snapshot.borrow_balance;
    let borrow_balance_quote = policy.mul(borrow_balance_underlying, price, "borrowed value")?;
    let market_total_supply_quote = policy.mul(
        policy.mul(market_supply, exchange_rate, "market supply")?,
        price,
        "market supply value",
    )?;
    let market_total_borrow_quote = policy.mul(total_borrows, price, "market borrow value")?;
    let liquidity_quote = policy.mul(cash, price, "liquidity value")?;

    let supply_apy = calc::annual_yield(supply_rate, decimals, req.rates)?;
    let borrow_apy = calc::annual_yield(borrow_rate, decimals, req.rates)?;
    let apy_decimals = calc::apy_decimals(decimals)?;

    debug!(
        market = %market,
        symbol = %asset.symbol,
        price_fallback = asset.price.is_fallback(),
        "market aggregated"
    );

    Ok(MarketView {
        market,
        underlying_address,
        symbol: asset.symbol,
        logo: asset.logo,
        supply_apy,
        borrow_apy,
        apy_decimals,
        underlying_allowance: asset.allowance,
        wallet_balance: asset.wallet_balance,
        supply_balance_underlying,
        supply_balance_quote,
        market_total_supply_quote,
        borrow_balance_underlying,
        borrow_balance_quote,
        market_total_borrow_underlying: total_borrows,
        market_total_borrow_quote,
        entered_as_collateral: req.ctx.is_entered(market),
        liquidity_underlying: cash,
        liquidity_quote,
        underlying_price: asset.price,
        collateral_factor,
        reward_speed,
        decimals,
        is_native: underlying_address.is_none(),
        fixed_point: policy,
    })
}
