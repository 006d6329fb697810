//! Money-market position views over EVM RPC reads.
//!
//! [`market`] holds the per-market view-models and the logic that builds them; [`chains`] holds
//! the RPC client that feeds it.

#![recursion_limit = "256"]

pub mod amount;
pub mod chains;
pub mod cli_output;
pub mod config;
pub mod errors;
pub mod fsutil;
pub mod market;
pub mod paths;
pub mod rate_math;
pub mod store;
