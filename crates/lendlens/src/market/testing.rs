//! In-memory `ChainReader` for exercising the resolver and aggregator without an RPC node.

use alloy::primitives::{Address, U256};
use std::collections::{BTreeMap, BTreeSet};

use super::aggregator::{aggregate_market, MarketRequest};
use super::calc::RateConstants;
use super::fixed::{FixedPointPolicy, MANTISSA};
use super::reader::{AccountSnapshot, ChainReader, MetadataEncoding};
use super::resolver::AssetSettings;
use super::{MarketView, OraclePrice, ProtocolContext};

pub const ACCOUNT: Address = Address::repeat_byte(0xaa);
pub const COMPTROLLER: Address = Address::repeat_byte(0xc0);
pub const ORACLE: Address = Address::repeat_byte(0x0c);

pub fn e18(v: u64) -> U256 {
    U256::from(v) * MANTISSA
}

#[derive(Debug, Clone, Default)]
pub struct FakeToken {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub encoding: Option<MetadataEncoding>,
    pub balances: BTreeMap<Address, U256>,
    pub allowances: BTreeMap<(Address, Address), U256>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeMarket {
    /// `None` for the native-coin market (its `underlying()` reverts).
    pub underlying: Option<Address>,
    pub snapshot: AccountSnapshot,
    pub total_supply: U256,
    pub exchange_rate: U256,
    pub total_borrows: U256,
    pub supply_rate: U256,
    pub borrow_rate: U256,
    pub cash: U256,
    pub collateral_factor: U256,
    pub reward_speed: U256,
    /// `None` makes the oracle revert for this market.
    pub price: Option<U256>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    pub native_balances: BTreeMap<Address, U256>,
    pub markets: BTreeMap<Address, FakeMarket>,
    pub tokens: BTreeMap<Address, FakeToken>,
    pub entered: Vec<Address>,
    /// `(read name, address)` pairs that fail.
    pub failing: BTreeSet<(&'static str, Address)>,
}

impl FakeChain {
    fn check(&self, read: &'static str, addr: Address) -> eyre::Result<()> {
        if self.failing.contains(&(read, addr)) {
            eyre::bail!("{read} reverted for {addr:#x}");
        }
        Ok(())
    }

    fn market(&self, read: &'static str, addr: Address) -> eyre::Result<&FakeMarket> {
        self.check(read, addr)?;
        self.markets
            .get(&addr)
            .ok_or_else(|| eyre::eyre!("{read}: no market at {addr:#x}"))
    }

    fn token(&self, read: &'static str, addr: Address) -> eyre::Result<&FakeToken> {
        self.check(read, addr)?;
        self.tokens
            .get(&addr)
            .ok_or_else(|| eyre::eyre!("{read}: no token at {addr:#x}"))
    }

    fn token_text(
        &self,
        read: &'static str,
        addr: Address,
        encoding: MetadataEncoding,
        pick: impl Fn(&FakeToken) -> &String,
    ) -> eyre::Result<String> {
        let t = self.token(read, addr)?;
        if t.encoding.unwrap_or(MetadataEncoding::String) != encoding {
            eyre::bail!("{read}: abi decode failed for {addr:#x}");
        }
        Ok(pick(t).clone())
    }
}

impl ChainReader for FakeChain {
    async fn native_balance(&self, owner: Address) -> eyre::Result<U256> {
        self.check("native_balance", owner)?;
        Ok(self.native_balances.get(&owner).copied().unwrap_or_default())
    }

    async fn underlying(&self, market: Address) -> eyre::Result<Address> {
        self.market("underlying", market)?
            .underlying
            .ok_or_else(|| eyre::eyre!("underlying() reverted"))
    }

    async fn account_snapshot(
        &self,
        market: Address,
        _account: Address,
    ) -> eyre::Result<AccountSnapshot> {
        Ok(self.market("account_snapshot", market)?.snapshot)
    }

    async fn exchange_rate_stored(&self, market: Address) -> eyre::Result<U256> {
        Ok(self.market("exchange_rate_stored", market)?.exchange_rate)
    }

    async fn total_borrows(&self, market: Address) -> eyre::Result<U256> {
        Ok(self.market("total_borrows", market)?.total_borrows)
    }

    async fn supply_rate_per_block(&self, market: Address) -> eyre::Result<U256> {
        Ok(self.market("supply_rate_per_block", market)?.supply_rate)
    }

    async fn borrow_rate_per_block(&self, market: Address) -> eyre::Result<U256> {
        Ok(self.market("borrow_rate_per_block", market)?.borrow_rate)
    }

    async fn cash(&self, market: Address) -> eyre::Result<U256> {
        Ok(self.market("cash", market)?.cash)
    }

    async fn total_supply(&self, token: Address) -> eyre::Result<U256> {
        if let Some(m) = self.markets.get(&token) {
            self.check("total_supply", token)?;
            return Ok(m.total_supply);
        }
        Ok(self.token("total_supply", token)?.total_supply)
    }

    async fn symbol(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String> {
        self.token_text("symbol", token, encoding, |t| &t.symbol)
    }

    async fn name(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String> {
        self.token_text("name", token, encoding, |t| &t.name)
    }

    async fn decimals(&self, token: Address) -> eyre::Result<u8> {
        Ok(self.token("decimals", token)?.decimals)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> eyre::Result<U256> {
        let t = self.token("balance_of", token)?;
        Ok(t.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> eyre::Result<U256> {
        let t = self.token("allowance", token)?;
        Ok(t.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn oracle(&self, comptroller: Address) -> eyre::Result<Address> {
        self.check("oracle", comptroller)?;
        Ok(ORACLE)
    }

    async fn assets_in(&self, comptroller: Address, _account: Address) -> eyre::Result<Vec<Address>> {
        self.check("assets_in", comptroller)?;
        Ok(self.entered.clone())
    }

    async fn all_markets(&self, comptroller: Address) -> eyre::Result<Vec<Address>> {
        self.check("all_markets", comptroller)?;
        Ok(self.markets.keys().copied().collect())
    }

    async fn collateral_factor(&self, _comptroller: Address, market: Address) -> eyre::Result<U256> {
        Ok(self.market("collateral_factor", market)?.collateral_factor)
    }

    async fn reward_speed(&self, _comptroller: Address, market: Address) -> eyre::Result<U256> {
        Ok(self.market("reward_speed", market)?.reward_speed)
    }

    async fn underlying_price(&self, _oracle: Address, market: Address) -> eyre::Result<U256> {
        self.market("underlying_price", market)?
            .price
            .ok_or_else(|| eyre::eyre!("getUnderlyingPrice reverted"))
    }
}

/// A chain with three markets:
/// - `NATIVE_MARKET`: native coin, entered as collateral;
/// - `DAI_MARKET`: a standard 18-decimal token;
/// - `MKR_MARKET`: a bytes32-metadata token.
pub const NATIVE_MARKET: Address = Address::repeat_byte(0x01);
pub const DAI_MARKET: Address = Address::repeat_byte(0x02);
pub const MKR_MARKET: Address = Address::repeat_byte(0x03);
pub const DAI: Address = Address::repeat_byte(0xd0);
pub const MKR: Address = Address::repeat_byte(0xe0);

pub fn sample_chain() -> FakeChain {
    let mut chain = FakeChain::default();
    chain.native_balances.insert(ACCOUNT, e18(5));

    chain.markets.insert(
        NATIVE_MARKET,
        FakeMarket {
            underlying: None,
            snapshot: AccountSnapshot {
                error: U256::ZERO,
                collateral_balance: U256::from(1000_u64),
                borrow_balance: U256::ZERO,
                exchange_rate: U256::from(2_u64),
            },
            total_supply: U256::from(10_000_u64),
            exchange_rate: U256::from(2_u64),
            total_borrows: U256::from(500_u64),
            supply_rate: U256::ZERO,
            borrow_rate: U256::from(2_430_555_556_u64),
            cash: U256::from(7_000_u64),
            collateral_factor: MANTISSA * U256::from(75_u64) / U256::from(100_u64),
            reward_speed: U256::from(9_u64),
            price: Some(U256::from(3_u64)),
        },
    );

    chain.markets.insert(
        DAI_MARKET,
        FakeMarket {
            underlying: Some(DAI),
            snapshot: AccountSnapshot {
                error: U256::ZERO,
                collateral_balance: U256::from(1000_u64),
                borrow_balance: U256::from(40_u64),
                exchange_rate: U256::from(105_u64),
            },
            total_supply: U256::from(100_000_u64),
            exchange_rate: U256::from(105_u64),
            total_borrows: U256::from(25_000_u64),
            supply_rate: U256::from(1_000_000_000_u64),
            borrow_rate: U256::from(2_000_000_000_u64),
            cash: U256::from(80_000_u64),
            collateral_factor: MANTISSA * U256::from(8_u64) / U256::from(10_u64),
            reward_speed: U256::ZERO,
            price: Some(U256::from(2_u64)),
        },
    );

    chain.markets.insert(
        MKR_MARKET,
        FakeMarket {
            underlying: Some(MKR),
            snapshot: AccountSnapshot::default(),
            total_supply: U256::from(50_u64),
            exchange_rate: U256::from(1_u64),
            cash: U256::from(50_u64),
            price: Some(U256::from(1500_u64)),
            ..FakeMarket::default()
        },
    );

    let mut dai = FakeToken {
        symbol: "DAI".to_owned(),
        name: "Dai Stablecoin".to_owned(),
        decimals: 18,
        total_supply: e18(1_000_000),
        ..FakeToken::default()
    };
    dai.balances.insert(ACCOUNT, e18(250));
    dai.allowances.insert((ACCOUNT, DAI_MARKET), e18(100));
    chain.tokens.insert(DAI, dai);

    let mut mkr = FakeToken {
        symbol: "MKR".to_owned(),
        name: "Maker".to_owned(),
        decimals: 18,
        total_supply: e18(1_000),
        encoding: Some(MetadataEncoding::Bytes32),
        ..FakeToken::default()
    };
    mkr.balances.insert(ACCOUNT, e18(2));
    chain.tokens.insert(MKR, mkr);

    chain.entered = vec![NATIVE_MARKET];
    chain
}

/// One entered native market at mainnet scales: 50 cETH (8 decimals) at an exchange rate of
/// 2e26 is 1 ETH supplied, 0.5 ETH borrowed, ETH at 2000, collateral factor 0.75, 100 ETH cash.
pub async fn mainnet_scale_view(policy: FixedPointPolicy) -> eyre::Result<MarketView> {
    let ctokens = U256::from(5_000_000_000_u64);
    let exchange_rate = U256::from(2_u64) * U256::from(10_u64).pow(U256::from(26_u64));
    let half_eth = e18(1) / U256::from(2_u64);

    let mut chain = FakeChain::default();
    chain.markets.insert(
        NATIVE_MARKET,
        FakeMarket {
            underlying: None,
            snapshot: AccountSnapshot {
                error: U256::ZERO,
                collateral_balance: ctokens,
                borrow_balance: half_eth,
                exchange_rate,
            },
            total_supply: ctokens,
            exchange_rate,
            total_borrows: half_eth,
            cash: e18(100),
            collateral_factor: MANTISSA * U256::from(75_u64) / U256::from(100_u64),
            price: Some(e18(2000)),
            ..FakeMarket::default()
        },
    );

    let ctx = ProtocolContext {
        comptroller: COMPTROLLER,
        oracle: ORACLE,
        entered_markets: [NATIVE_MARKET].into_iter().collect(),
    };
    let settings = AssetSettings {
        native_symbol: "ETH".to_owned(),
        native_name: "Ether".to_owned(),
        bytes32_metadata_tokens: BTreeSet::new(),
        logos: BTreeMap::new(),
    };
    let rates = RateConstants::default();
    aggregate_market(
        &chain,
        &MarketRequest {
            market: NATIVE_MARKET,
            is_native: true,
            account: ACCOUNT,
            ctx: &ctx,
            settings: &settings,
            rates: &rates,
            policy,
        },
    )
    .await
}

/// A bare native-market view with the given quote balances and collateral factor.
///
/// The view is `Raw`, so the supplied value carries the exchange-rate mantissa.
pub fn view(supply: u64, borrow: u64, cf_percent: u64, entered: bool) -> MarketView {
    MarketView {
        market: Address::repeat_byte(0x11),
        underlying_address: None,
        symbol: "ETH".to_owned(),
        logo: None,
        supply_apy: U256::ZERO,
        borrow_apy: U256::ZERO,
        apy_decimals: 18,
        underlying_allowance: U256::MAX,
        wallet_balance: U256::ZERO,
        supply_balance_underlying: U256::ZERO,
        supply_balance_quote: U256::from(supply) * MANTISSA,
        market_total_supply_quote: U256::ZERO,
        borrow_balance_underlying: U256::ZERO,
        borrow_balance_quote: U256::from(borrow),
        market_total_borrow_underlying: U256::ZERO,
        market_total_borrow_quote: U256::ZERO,
        entered_as_collateral: entered,
        liquidity_underlying: U256::ZERO,
        liquidity_quote: U256::ZERO,
        underlying_price: OraclePrice::Quoted(U256::from(1_u64)),
        collateral_factor: MANTISSA * U256::from(cf_percent) / U256::from(100_u64),
        reward_speed: U256::ZERO,
        decimals: 18,
        is_native: true,
        fixed_point: FixedPointPolicy::Raw,
    }
}
