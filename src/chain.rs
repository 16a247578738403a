//! Boundary between the swap engine and a blockchain node.
//!
//! The engine only talks to the chain through [`ChainConnection`]. Hosts
//! hand in a connection that already owns the signer, so nothing here reads
//! wallet state implicitly. [`crate::onchain::AlloyConnection`] is the
//! provider backed implementation.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::ChainError;
use crate::swap::SwapCallParams;

/// Reserves of a pair as stored by the pool, in token0/token1 order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPoolState {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

/// An ERC-20 transfer emitted inside a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfirmationStatus {
    // still waiting in the mempool
    Pending,
    Confirmed { block_number: u64, transfers: Vec<TokenTransfer> },
    Reverted { block_number: u64 },
}

pub type ConfirmationStream = BoxStream<'static, Result<ConfirmationStatus, ChainError>>;

#[async_trait]
pub trait ChainConnection: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Address of the signer transactions are sent from
    fn account(&self) -> Address;

    /// `Ok(None)` when no pool exists for the pair
    async fn fetch_pool_state(&self, token_a: Address, token_b: Address) -> Result<Option<RawPoolState>, ChainError>;

    async fn estimate_gas(&self, call: &SwapCallParams) -> Result<u64, ChainError>;

    async fn submit_transaction(&self, call: &SwapCallParams, gas_limit: u64) -> Result<TxHash, ChainError>;

    /// Status updates for a submitted transaction. The stream ends after a
    /// terminal status.
    fn subscribe_confirmation(&self, tx_hash: TxHash) -> ConfirmationStream;
}
