use alloy::primitives::TxHash;
use serde::Serialize;
use std::fmt;

use crate::calculation::Trade;
use crate::error::SwapError;
use crate::swap::{GasEstimate, SwapCallParams};
use crate::token::TokenAmount;

/// Steps of a single swap attempt, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapState {
    Idle,
    Validating,
    Quoting,
    Building,
    Estimating,
    Submitting,
    Pending,
    Confirmed,
    Failed,
}

impl SwapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::Confirmed | SwapState::Failed)
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapState::Idle => "idle",
            SwapState::Validating => "validating",
            SwapState::Quoting => "quoting",
            SwapState::Building => "building",
            SwapState::Estimating => "estimating",
            SwapState::Submitting => "submitting",
            SwapState::Pending => "pending",
            SwapState::Confirmed => "confirmed",
            SwapState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReceiptStatus {
    Pending,
    Confirmed,
    Reverted,
}

/// Outcome of a submitted swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
    // only known once the transaction is mined
    pub amount_out: Option<TokenAmount>,
}

/// Payload attached to a snapshot, depends on the step that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SnapshotData {
    Quote { trade: Trade, min_out: TokenAmount },
    Call(SwapCallParams),
    Gas(GasEstimate),
    Submitted { tx_hash: TxHash },
    Receipt(SwapReceipt),
}

/// What the presentation layer gets on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapSnapshot {
    pub state: SwapState,
    pub data: Option<SnapshotData>,
    pub error: Option<SwapError>,
}
