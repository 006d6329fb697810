use alloy::primitives::Address;
use eyre::Context as _;
use futures::future::join_all;
use tracing::{info, warn};

use super::aggregator::{aggregate_market, MarketRequest};
use super::reader::ChainReader;
use super::resolver::AssetSettings;
use super::{MarketView, ProtocolContext};
use crate::config::{LensConfig, NetworkConfig};
use crate::errors::LensError;

/// Result of one refresh: the shared context plus each market's outcome, in market order.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub ctx: ProtocolContext,
    pub markets: Vec<(Address, eyre::Result<MarketView>)>,
}

impl RefreshOutcome {
    pub fn views(&self) -> Vec<&MarketView> {
        self.markets
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .collect()
    }

    pub fn failures(&self) -> Vec<(Address, String)> {
        self.markets
            .iter()
            .filter_map(|(m, r)| r.as_ref().err().map(|e| (*m, format!("{e:#}"))))
            .collect()
    }
}

/// Read the oracle address and the caller's entered markets from the comptroller.
pub async fn load_protocol_context<R: ChainReader>(
    reader: &R,
    comptroller: Address,
    account: Address,
) -> eyre::Result<ProtocolContext> {
    let (oracle, entered) = tokio::try_join!(
        async {
            reader
                .oracle(comptroller)
                .await
                .context("read comptroller oracle()")
        },
        async {
            reader
                .assets_in(comptroller, account)
                .await
                .context("read comptroller getAssetsIn()")
        },
    )?;
    Ok(ProtocolContext {
        comptroller,
        oracle,
        entered_markets: entered.into_iter().collect(),
    })
}

/// Markets to aggregate: `only` if given, else the configured list, else `getAllMarkets()`.
pub async fn market_list<R: ChainReader>(
    reader: &R,
    network: &NetworkConfig,
    comptroller: Address,
    only: &[Address],
) -> eyre::Result<Vec<Address>> {
    if !only.is_empty() {
        return Ok(only.to_vec());
    }
    if !network.markets.is_empty() {
        return Ok(network.markets.clone());
    }
    reader
        .all_markets(comptroller)
        .await
        .context("read comptroller getAllMarkets()")
}

/// Aggregate every market of `chain` for `account`.
///
/// Fails only when the shared context cannot be loaded; per-market failures are reported in
/// the outcome.
pub async fn refresh<R: ChainReader>(
    reader: &R,
    cfg: &LensConfig,
    chain: &str,
    account: Address,
    only: &[Address],
) -> eyre::Result<RefreshOutcome> {
    let network = cfg.network(chain)?;
    let comptroller = network
        .comptroller
        .ok_or_else(|| LensError::MissingComptroller(chain.to_owned()))?;

    let (ctx, markets) = tokio::try_join!(
        load_protocol_context(reader, comptroller, account),
        market_list(reader, network, comptroller, only),
    )?;

    let settings = AssetSettings::from_config(cfg, network);
    let rates = cfg.rate_constants(network);
    let policy = cfg.calculator.fixed_point;

    let requests: Vec<MarketRequest<'_>> = markets
        .iter()
        .map(|&market| MarketRequest {
            market,
            is_native: network.native_market == Some(market),
            account,
            ctx: &ctx,
            settings: &settings,
            rates: &rates,
            policy,
        })
        .collect();
    let results = join_all(requests.iter().map(|req| aggregate_market(reader, req))).await;

    let mut out = Vec::with_capacity(markets.len());
    for (market, res) in markets.iter().copied().zip(results) {
        if let Err(e) = &res {
            warn!(market = %market, error = %format!("{e:#}"), "market aggregation failed");
        }
        out.push((market, res));
    }

    info!(
        chain,
        account = %account,
        markets = out.len(),
        failed = out.iter().filter(|(_, r)| r.is_err()).count(),
        "refresh complete"
    );
    Ok(RefreshOutcome { ctx, markets: out })
}
