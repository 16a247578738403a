use alloy::primitives::{address, b256, Address, B256};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::calculation::FeeModel;
use crate::swap::DEFAULT_DEADLINE;

// uniswap v2 mainnet deployment
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
pub const UNISWAP_V2_FACTORY: Address = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
pub const UNISWAP_V2_INIT_CODE_HASH: B256 =
    b256!("96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");

/// Knobs of the executor itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapConfig {
    pub fee: FeeModel,
    // used when the request does not carry its own offset
    pub default_deadline: Duration,
    // how long to wait for a receipt before giving up locally
    pub confirmation_timeout: Duration,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            fee: FeeModel::None,
            default_deadline: DEFAULT_DEADLINE,
            confirmation_timeout: DEFAULT_DEADLINE,
        }
    }
}

/// Where and how to reach the chain
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub chain_id: u64,
    pub router: Address,
    pub factory: Address,
    pub init_code_hash: B256,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub chain: ChainConfig,
    pub swap: SwapConfig,
}

impl EngineConfig {
    /// Load everything from the environment, a `.env` file is picked up if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let chain = ChainConfig {
            rpc_url: required("HTTP")?,
            private_key: required("PRIVATE_KEY")?,
            chain_id: optional("CHAIN_ID")?.unwrap_or(1),
            router: optional("ROUTER")?.unwrap_or(UNISWAP_V2_ROUTER),
            factory: optional("FACTORY")?.unwrap_or(UNISWAP_V2_FACTORY),
            init_code_hash: optional("INIT_CODE_HASH")?.unwrap_or(UNISWAP_V2_INIT_CODE_HASH),
            poll_interval: Duration::from_millis(optional("POLL_INTERVAL_MS")?.unwrap_or(2_000)),
        };

        let defaults = SwapConfig::default();
        let fee = match optional::<u32>("FEE_BPS")? {
            Some(0) | None => FeeModel::None,
            Some(bps) => FeeModel::Bps(bps),
        };
        let swap = SwapConfig {
            fee,
            default_deadline: optional("DEADLINE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_deadline),
            confirmation_timeout: optional("CONFIRMATION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirmation_timeout),
        };

        Ok(Self { chain, swap })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing environment variable {}", key))
}

fn optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(None),
    }
}
