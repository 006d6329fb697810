use alloy::{
    primitives::{Address, U256},
    providers::{Provider as _, RootProvider},
    sol,
};
use eyre::Context as _;
use reqwest::Client;
use std::time::Duration;

use crate::config::NetworkConfig;
use crate::market::reader::{decode_bytes32_text, AccountSnapshot, ChainReader, MetadataEncoding};

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type EvmProvider = RootProvider;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    contract IBytes32Token {
        function name() external view returns (bytes32);
        function symbol() external view returns (bytes32);
    }
}

sol! {
    #[sol(rpc)]
    contract ICToken {
        function underlying() external view returns (address);
        function getAccountSnapshot(address account)
            external view returns (uint256 err, uint256 cTokenBalance, uint256 borrowBalance, uint256 exchangeRateMantissa);
        function exchangeRateStored() external view returns (uint256);
        function totalBorrows() external view returns (uint256);
        function supplyRatePerBlock() external view returns (uint256);
        function borrowRatePerBlock() external view returns (uint256);
        function getCash() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    contract IComptroller {
        function oracle() external view returns (address);
        function getAssetsIn(address account) external view returns (address[]);
        function getAllMarkets() external view returns (address[]);
        // Later comptrollers append fields; the leading pair is stable across forks.
        function markets(address cToken) external view returns (bool isListed, uint256 collateralFactorMantissa);
        function compSpeeds(address cToken) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    contract IPriceOracle {
        function getUnderlyingPrice(address cToken) external view returns (uint256);
    }
}

/// Read-only client for one EVM network.
#[derive(Debug, Clone)]
pub struct EvmChain {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    provider: EvmProvider,
}

impl EvmChain {
    pub fn for_network(name: &str, network: &NetworkConfig) -> eyre::Result<Self> {
        Ok(Self {
            name: name.to_owned(),
            chain_id: network.chain_id,
            rpc_url: network.rpc_url.clone(),
            provider: Self::provider_for_url(&network.rpc_url)?,
        })
    }

    fn provider_for_url(url: &str) -> eyre::Result<EvmProvider> {
        let u: reqwest::Url = url
            .parse()
            .with_context(|| format!("invalid rpc url: {url}"))?;
        let client = Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
            .build()
            .context("build rpc http client")?;
        let http = alloy::transports::http::Http::with_client(client, u);
        let rpc_client = alloy::rpc::client::RpcClient::new(http, false);
        Ok(RootProvider::new(rpc_client))
    }
}

impl ChainReader for EvmChain {
    async fn native_balance(&self, owner: Address) -> eyre::Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .context("get balance")
    }

    async fn underlying(&self, market: Address) -> eyre::Result<Address> {
        let c = ICToken::new(market, &self.provider);
        c.underlying().call().await.context("ctoken underlying")
    }

    async fn account_snapshot(
        &self,
        market: Address,
        account: Address,
    ) -> eyre::Result<AccountSnapshot> {
        let c = ICToken::new(market, &self.provider);
        let r = c
            .getAccountSnapshot(account)
            .call()
            .await
            .context("ctoken getAccountSnapshot")?;
        Ok(AccountSnapshot {
            error: r.err,
            collateral_balance: r.cTokenBalance,
            borrow_balance: r.borrowBalance,
            exchange_rate: r.exchangeRateMantissa,
        })
    }

    async fn exchange_rate_stored(&self, market: Address) -> eyre::Result<U256> {
        let c = ICToken::new(market, &self.provider);
        c.exchangeRateStored()
            .call()
            .await
            .context("ctoken exchangeRateStored")
    }

    async fn total_borrows(&self, market: Address) -> eyre::Result<U256> {
        let c = ICToken::new(market, &self.provider);
        c.totalBorrows().call().await.context("ctoken totalBorrows")
    }

    async fn supply_rate_per_block(&self, market: Address) -> eyre::Result<U256> {
        let c = ICToken::new(market, &self.provider);
        c.supplyRatePerBlock()
            .call()
            .await
            .context("ctoken supplyRatePerBlock")
    }

    async fn borrow_rate_per_block(&self, market: Address) -> eyre::Result<U256> {
        let c = ICToken::new(market, &self.provider);
        c.borrowRatePerBlock()
            .call()
            .await
            .context("ctoken borrowRatePerBlock")
    }

    async fn cash(&self, market: Address) -> eyre::Result<U256> {
        let c = ICToken::new(market, &self.provider);
        c.getCash().call().await.context("ctoken getCash")
    }

    async fn total_supply(&self, token: Address) -> eyre::Result<U256> {
        let c = IERC20::new(token, &self.provider);
        c.totalSupply().call().await.context("erc20 totalSupply")
    }

    async fn symbol(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String> {
        match encoding {
            MetadataEncoding::String => {
                let c = IERC20::new(token, &self.provider);
                c.symbol().call().await.context("erc20 symbol")
            }
            MetadataEncoding::Bytes32 => {
                let c = IBytes32Token::new(token, &self.provider);
                let raw = c.symbol().call().await.context("bytes32 symbol")?;
                decode_bytes32_text(&raw.0)
            }
        }
    }

    async fn name(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String> {
        match encoding {
            MetadataEncoding::String => {
                let c = IERC20::new(token, &self.provider);
                c.name().call().await.context("erc20 name")
            }
            MetadataEncoding::Bytes32 => {
                let c = IBytes32Token::new(token, &self.provider);
                let raw = c.name().call().await.context("bytes32 name")?;
                decode_bytes32_text(&raw.0)
            }
        }
    }

    async fn decimals(&self, token: Address) -> eyre::Result<u8> {
        let c = IERC20::new(token, &self.provider);
        c.decimals().call().await.context("erc20 decimals")
    }

    async fn balance_of(&self, token: Address, owner: Address) -> eyre::Result<U256> {
        let c = IERC20::new(token, &self.provider);
        c.balanceOf(owner).call().await.context("erc20 balanceOf")
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> eyre::Result<U256> {
        let c = IERC20::new(token, &self.provider);
        c.allowance(owner, spender)
            .call()
            .await
            .context("erc20 allowance")
    }

    async fn oracle(&self, comptroller: Address) -> eyre::Result<Address> {
        let c = IComptroller::new(comptroller, &self.provider);
        c.oracle().call().await.context("comptroller oracle")
    }

    async fn assets_in(&self, comptroller: Address, account: Address) -> eyre::Result<Vec<Address>> {
        let c = IComptroller::new(comptroller, &self.provider);
        c.getAssetsIn(account)
            .call()
            .await
            .context("comptroller getAssetsIn")
    }

    async fn all_markets(&self, comptroller: Address) -> eyre::Result<Vec<Address>> {
        let c = IComptroller::new(comptroller, &self.provider);
        c.getAllMarkets()
            .call()
            .await
            .context("comptroller getAllMarkets")
    }

    async fn collateral_factor(&self, comptroller: Address, market: Address) -> eyre::Result<U256> {
        let c = IComptroller::new(comptroller, &self.provider);
        let r = c
            .markets(market)
            .call()
            .await
            .context("comptroller markets")?;
        Ok(r.collateralFactorMantissa)
    }

    async fn reward_speed(&self, comptroller: Address, market: Address) -> eyre::Result<U256> {
        let c = IComptroller::new(comptroller, &self.provider);
        c.compSpeeds(market)
            .call()
            .await
            .context("comptroller compSpeeds")
    }

    async fn underlying_price(&self, oracle: Address, market: Address) -> eyre::Result<U256> {
        let c = IPriceOracle::new(oracle, &self.provider);
        c.getUnderlyingPrice(market)
            .call()
            .await
            .context("oracle getUnderlyingPrice")
    }
}
