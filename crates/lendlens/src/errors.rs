use alloy::primitives::Address;
use thiserror::Error;

/// Domain failures that callers may want to match on.
///
/// Everything else travels as an `eyre::Report` with context attached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LensError {
    #[error("fixed-point overflow computing {0}")]
    FixedPointOverflow(&'static str),

    #[error("unsupported token decimals: {0} (must be <= 36)")]
    UnsupportedDecimals(u8),

    #[error("per-block rate out of range: {0}")]
    RateOutOfRange(String),

    #[error("invalid rate constants: {0}")]
    InvalidRateConstants(String),

    #[error("account snapshot for market {market} returned error code {code}")]
    SnapshotError { market: Address, code: String },

    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("no comptroller configured for chain {0}")]
    MissingComptroller(String),

    #[error("native-coin markets do not take token approvals")]
    NativeApproval,
}

/// A rejected user amount, with the message shown next to the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountRejection {
    #[error("Amount must be a number")]
    NotANumber,

    #[error("Amount must be > 0")]
    NotPositive,

    #[error("Amount has more than {decimals} decimal places")]
    TooPrecise { decimals: u8 },

    #[error("Amount must be <= borrow limit")]
    ExceedsBorrowLimit,

    #[error("Amount must be <= liquidity")]
    ExceedsLiquidity,

    #[error("Amount must be <= your borrow balance")]
    ExceedsBorrowBalance,

    #[error("Amount must be <= balance")]
    ExceedsWalletBalance,

    #[error("Amount is too large")]
    Overflow,
}
