use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a single user supplied field was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationReason {
    Empty,
    MalformedAddress,
    BadChecksum,
    IdenticalTokens,
    NotNumeric,
    Negative,
    Zero,
    TooManyDecimals,
    Overflow,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationReason::Empty => "value is empty",
            ValidationReason::MalformedAddress => "not a valid address",
            ValidationReason::BadChecksum => "address checksum does not match",
            ValidationReason::IdenticalTokens => "from and to tokens are the same",
            ValidationReason::NotNumeric => "not a decimal number",
            ValidationReason::Negative => "amount is negative",
            ValidationReason::Zero => "amount must be greater than zero",
            ValidationReason::TooManyDecimals => "more decimals than the token supports",
            ValidationReason::Overflow => "amount does not fit in 256 bits",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Every way a swap attempt can fail.
///
/// Nothing in the engine retries on any of these. `Network` is the only
/// transient one, and even then the caller has to start a fresh attempt so
/// the trade is priced against new reserves.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SwapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no pool exists for {token_a:#x}/{token_b:#x}")]
    PoolNotFound { token_a: Address, token_b: Address },
    #[error("pool has insufficient liquidity")]
    InsufficientLiquidity,
    #[error("input amount too small, output rounds to zero")]
    InsufficientInputAmount,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid slippage tolerance: {0}")]
    InvalidSlippage(String),
    #[error("amounts belong to different tokens: {0:#x} and {1:#x}")]
    TokenMismatch(Address, Address),
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
    #[error("network error: {0}")]
    Network(String),
    #[error("gas estimation rejected, trade no longer executable: {0}")]
    Estimation(String),
    // node refused the signed transaction (funds, nonce), nothing was broadcast
    #[error("transaction rejected by node: {0}")]
    Submission(String),
    #[error("transaction {tx_hash:#x} not confirmed before deadline {deadline}")]
    DeadlineExceeded { tx_hash: TxHash, deadline: u64 },
    #[error("transaction {tx_hash:#x} reverted on chain")]
    TransactionReverted { tx_hash: TxHash },
    #[error("swap cancelled by caller")]
    Cancelled { tx_hash: Option<TxHash> },
}

/// Error surfaced by a [`crate::chain::ChainConnection`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    // the node answered but refused the request (revert, bad params)
    #[error("rejected by node: {0}")]
    Rejected(String),
    #[error("{0}")]
    Network(String),
}

impl From<ChainError> for SwapError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rejected(msg) | ChainError::Network(msg) => SwapError::Network(msg),
        }
    }
}
