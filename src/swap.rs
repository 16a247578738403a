use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use chrono::Utc;
use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;

use crate::bindings::UniswapV2Router;
use crate::calculation::Trade;
use crate::chain::ChainConnection;
use crate::error::{ChainError, SwapError};
use crate::token::TokenAmount;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60 * 20);

/// Everything the router call needs, with the deadline already fixed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapCallParams {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    // absolute unix timestamp in seconds
    pub deadline: u64,
}

impl SwapCallParams {
    // abi encoded swapExactTokensForTokens call
    pub fn calldata(&self) -> Bytes {
        UniswapV2Router::swapExactTokensForTokensCall {
            amountIn: self.amount_in,
            amountOutMin: self.amount_out_min,
            path: self.path.clone(),
            to: self.to,
            deadline: U256::from(self.deadline),
        }
        .abi_encode()
        .into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasEstimate {
    pub gas_limit: u64,
}

/// Build the router call at the current wall clock time
pub fn build_swap_call(
    trade: &Trade,
    min_out: &TokenAmount,
    recipient: Address,
    deadline_offset: Duration,
) -> Result<SwapCallParams, SwapError> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    build_swap_call_at(trade, min_out, recipient, deadline_offset, now)
}

/// Build the router call with `now` (unix seconds) as the reference instant
pub fn build_swap_call_at(
    trade: &Trade,
    min_out: &TokenAmount,
    recipient: Address,
    deadline_offset: Duration,
    now: u64,
) -> Result<SwapCallParams, SwapError> {
    if min_out.token != trade.token_out() {
        return Err(SwapError::TokenMismatch(min_out.token.address, trade.token_out().address));
    }
    let deadline = now
        .checked_add(deadline_offset.as_secs())
        .ok_or(SwapError::Overflow("deadline"))?;

    Ok(SwapCallParams {
        amount_in: trade.input.raw,
        amount_out_min: min_out.raw,
        path: trade.route.iter().map(|token| token.address).collect(),
        to: recipient,
        deadline,
    })
}

/// Ask the node what the exact call will cost. A refusal means the trade
/// cannot execute against current state and has to be quoted again.
pub async fn estimate_gas<C: ChainConnection + ?Sized>(
    connection: &C,
    call: &SwapCallParams,
) -> Result<GasEstimate, SwapError> {
    match connection.estimate_gas(call).await {
        Ok(gas_limit) => {
            debug!("Estimated {} gas for swap with min out {}", gas_limit, call.amount_out_min);
            Ok(GasEstimate { gas_limit })
        }
        Err(ChainError::Rejected(reason)) => {
            warn!("Gas estimation rejected: {}", reason);
            Err(SwapError::Estimation(reason))
        }
        Err(ChainError::Network(reason)) => Err(SwapError::Network(reason)),
    }
}
