//! Unsigned transaction requests for the market actions.
//!
//! Nothing here signs or sends; callers hand the request to a wallet.

use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, U256},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolCall as _,
};
use serde_json::{json, Value};

use crate::errors::LensError;

sol! {
    interface ICErc20Actions {
        function mint(uint256 mintAmount) external returns (uint256);
        function redeemUnderlying(uint256 redeemAmount) external returns (uint256);
        function borrow(uint256 borrowAmount) external returns (uint256);
        function repayBorrow(uint256 repayAmount) external returns (uint256);
    }

    interface ICEtherActions {
        function mint() external payable;
        function repayBorrow() external payable;
    }

    interface IERC20Approve {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IComptrollerActions {
        function enterMarkets(address[] cTokens) external returns (uint256[]);
    }
}

fn call(from: Address, to: Address, calldata: Vec<u8>) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_input(Bytes::from(calldata))
}

/// Supply `amount` of the underlying. Native markets take the coin as call value.
pub fn supply(from: Address, market: Address, amount: U256, is_native: bool) -> TransactionRequest {
    if is_native {
        call(from, market, ICEtherActions::mintCall {}.abi_encode()).with_value(amount)
    } else {
        call(
            from,
            market,
            ICErc20Actions::mintCall {
                mintAmount: amount,
            }
            .abi_encode(),
        )
    }
}

pub fn withdraw(from: Address, market: Address, amount: U256) -> TransactionRequest {
    call(
        from,
        market,
        ICErc20Actions::redeemUnderlyingCall {
            redeemAmount: amount,
        }
        .abi_encode(),
    )
}

pub fn borrow(from: Address, market: Address, amount: U256) -> TransactionRequest {
    call(
        from,
        market,
        ICErc20Actions::borrowCall {
            borrowAmount: amount,
        }
        .abi_encode(),
    )
}

/// Repay borrowed underlying.
///
/// A full token repay sends `uint256.max`, which the market reads as "everything owed at
/// execution time". Native repays carry `amount` as call value.
pub fn repay(
    from: Address,
    market: Address,
    amount: U256,
    full: bool,
    is_native: bool,
) -> TransactionRequest {
    if is_native {
        return call(from, market, ICEtherActions::repayBorrowCall {}.abi_encode())
            .with_value(amount);
    }
    let repay_amount = if full { U256::MAX } else { amount };
    call(
        from,
        market,
        ICErc20Actions::repayBorrowCall {
            repayAmount: repay_amount,
        }
        .abi_encode(),
    )
}

/// Approve `market` to pull the underlying token. `amount` defaults to unlimited.
pub fn approve(
    from: Address,
    underlying: Option<Address>,
    market: Address,
    amount: Option<U256>,
) -> Result<TransactionRequest, LensError> {
    let token = underlying.ok_or(LensError::NativeApproval)?;
    Ok(call(
        from,
        token,
        IERC20Approve::approveCall {
            spender: market,
            amount: amount.unwrap_or(U256::MAX),
        }
        .abi_encode(),
    ))
}

/// Enter `market` as collateral.
pub fn enter_market(from: Address, comptroller: Address, market: Address) -> TransactionRequest {
    call(
        from,
        comptroller,
        IComptrollerActions::enterMarketsCall {
            cTokens: vec![market],
        }
        .abi_encode(),
    )
}

pub fn tx_json(tx: &TransactionRequest) -> Value {
    json!({
        "from": tx.from.map(|a| format!("{a:#x}")),
        "to": tx.to.and_then(|k| k.to().copied()).map(|a| format!("{a:#x}")),
        "value": tx.value.unwrap_or_default().to_string(),
        "data": tx.input.input().map(|b| format!("0x{}", hex::encode(b))),
    })
}
