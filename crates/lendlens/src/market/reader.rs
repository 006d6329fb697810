use alloy::primitives::{Address, U256};

/// How a token publishes `symbol()` and `name()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEncoding {
    String,
    /// Right-padded `bytes32` (e.g. MKR).
    Bytes32,
}

/// Return value of `getAccountSnapshot(account)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    /// Protocol error code; zero on success.
    pub error: U256,
    pub collateral_balance: U256,
    pub borrow_balance: U256,
    pub exchange_rate: U256,
}

/// Contract reads the resolver and aggregator depend on.
///
/// Implementations own transport concerns (endpoints, timeouts). Every read is independent, so
/// callers are free to run them concurrently.
#[expect(
    async_fn_in_trait,
    reason = "implementations are driven on one task; no Send bound is needed"
)]
pub trait ChainReader {
    async fn native_balance(&self, owner: Address) -> eyre::Result<U256>;

    async fn underlying(&self, market: Address) -> eyre::Result<Address>;
    async fn account_snapshot(
        &self,
        market: Address,
        account: Address,
    ) -> eyre::Result<AccountSnapshot>;
    async fn exchange_rate_stored(&self, market: Address) -> eyre::Result<U256>;
    async fn total_borrows(&self, market: Address) -> eyre::Result<U256>;
    async fn supply_rate_per_block(&self, market: Address) -> eyre::Result<U256>;
    async fn borrow_rate_per_block(&self, market: Address) -> eyre::Result<U256>;
    async fn cash(&self, market: Address) -> eyre::Result<U256>;

    /// `totalSupply()` of an ERC-20, including a market's own collateral token.
    async fn total_supply(&self, token: Address) -> eyre::Result<U256>;
    async fn symbol(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String>;
    async fn name(&self, token: Address, encoding: MetadataEncoding) -> eyre::Result<String>;
    async fn decimals(&self, token: Address) -> eyre::Result<u8>;
    async fn balance_of(&self, token: Address, owner: Address) -> eyre::Result<U256>;
    async fn allowance(&self, token: Address, owner: Address, spender: Address)
        -> eyre::Result<U256>;

    async fn oracle(&self, comptroller: Address) -> eyre::Result<Address>;
    async fn assets_in(&self, comptroller: Address, account: Address) -> eyre::Result<Vec<Address>>;
    async fn all_markets(&self, comptroller: Address) -> eyre::Result<Vec<Address>>;
    async fn collateral_factor(&self, comptroller: Address, market: Address) -> eyre::Result<U256>;
    async fn reward_speed(&self, comptroller: Address, market: Address) -> eyre::Result<U256>;

    async fn underlying_price(&self, oracle: Address, market: Address) -> eyre::Result<U256>;
}

/// Decode a right-padded `bytes32` string, dropping trailing NULs.
pub fn decode_bytes32_text(raw: &[u8; 32]) -> eyre::Result<String> {
    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let text = raw.get(..end).unwrap_or_default();
    if text.contains(&0) {
        eyre::bail!("bytes32 string has an interior NUL");
    }
    String::from_utf8(text.to_vec()).map_err(|e| eyre::eyre!("bytes32 string is not utf-8: {e}"))
}
