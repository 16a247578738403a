//! Single pair swap execution on top of uniswap v2 style pools.
//!
//! The flow for one attempt is reserve fetch, constant product pricing,
//! slippage bound, router call construction, gas estimation, submission and
//! confirmation tracking. [`executor::SwapExecutor`] ties the steps together
//! and reports each transition as a [`events::SwapSnapshot`].

pub mod bindings;
pub mod calculation;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod onchain;
pub mod request;
pub mod reserves;
pub mod swap;
pub mod token;

#[cfg(test)]
mod tests;

pub use calculation::{FeeModel, SlippageBound, Trade, TradeCalculator, TradeType};
pub use chain::{ChainConnection, ConfirmationStatus, RawPoolState, TokenTransfer};
pub use config::{ChainConfig, EngineConfig, SwapConfig};
pub use error::{ChainError, SwapError, ValidationError, ValidationReason};
pub use events::{ReceiptStatus, SnapshotData, SwapReceipt, SwapSnapshot, SwapState};
pub use executor::{SwapExecutor, SwapFailure};
pub use onchain::AlloyConnection;
pub use request::{SwapRequest, ValidatedSwap};
pub use reserves::{PairReserveOracle, PoolReserves};
pub use swap::{GasEstimate, SwapCallParams};
pub use token::{Token, TokenAmount};
