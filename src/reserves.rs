use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::chain::ChainConnection;
use crate::error::{SwapError, ValidationError, ValidationReason};
use crate::token::{Token, TokenAmount};

/// Snapshot of a pair's reserves, oriented as (token_a, token_b)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolReserves {
    pub pool: Address,
    pub reserve_a: TokenAmount,
    pub reserve_b: TokenAmount,
    pub fetched_at: DateTime<Utc>,
}

impl PoolReserves {
    pub fn new(pool: Address, reserve_a: TokenAmount, reserve_b: TokenAmount) -> Self {
        Self {
            pool,
            reserve_a,
            reserve_b,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }

    // Get (reserve_in, reserve_out) for a swap that starts with token_in
    pub fn oriented(&self, token_in: &Token) -> Result<(TokenAmount, TokenAmount), SwapError> {
        if *token_in == self.reserve_a.token {
            Ok((self.reserve_a, self.reserve_b))
        } else if *token_in == self.reserve_b.token {
            Ok((self.reserve_b, self.reserve_a))
        } else {
            Err(SwapError::TokenMismatch(token_in.address, self.reserve_a.token.address))
        }
    }
}

/// Reads pair reserves through a chain connection. Never caches and never
/// retries, each call is a fresh snapshot.
pub struct PairReserveOracle<'a, C: ChainConnection + ?Sized> {
    connection: &'a C,
}

impl<'a, C: ChainConnection + ?Sized> PairReserveOracle<'a, C> {
    pub fn new(connection: &'a C) -> Self {
        Self { connection }
    }

    pub async fn fetch_reserves(&self, token_a: &Token, token_b: &Token) -> Result<PoolReserves, SwapError> {
        if token_a == token_b {
            return Err(ValidationError::new("to_token", ValidationReason::IdenticalTokens).into());
        }
        if token_a.chain_id != token_b.chain_id {
            return Err(SwapError::TokenMismatch(token_a.address, token_b.address));
        }

        let state = self
            .connection
            .fetch_pool_state(token_a.address, token_b.address)
            .await?
            .ok_or(SwapError::PoolNotFound {
                token_a: token_a.address,
                token_b: token_b.address,
            })?;

        // the pool reports in its own token order
        let (raw_a, raw_b) = if state.token0 == token_a.address && state.token1 == token_b.address {
            (state.reserve0, state.reserve1)
        } else if state.token0 == token_b.address && state.token1 == token_a.address {
            (state.reserve1, state.reserve0)
        } else {
            return Err(SwapError::PoolNotFound {
                token_a: token_a.address,
                token_b: token_b.address,
            });
        };
        debug!("Reserves for pool {:#x}: {} / {}", state.pool, raw_a, raw_b);

        let reserves = PoolReserves::new(
            state.pool,
            TokenAmount::new(*token_a, raw_a),
            TokenAmount::new(*token_b, raw_b),
        );
        if !reserves.is_usable() {
            return Err(SwapError::InsufficientLiquidity);
        }
        Ok(reserves)
    }
}
