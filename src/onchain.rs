use alloy::network::EthereumWallet;
use alloy::primitives::{keccak256, Address, TxHash, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::transports::{RpcError, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info};
use std::time::Duration;

use crate::bindings::{UniswapV2Pair, UniswapV2Router, ERC20};
use crate::chain::{ChainConnection, ConfirmationStatus, ConfirmationStream, RawPoolState, TokenTransfer};
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::swap::SwapCallParams;

/// Chain connection backed by an alloy http provider and a local signer,
/// talking to a uniswap v2 style router and factory
pub struct AlloyConnection {
    provider: DynProvider,
    account: Address,
    chain_id: u64,
    router: Address,
    factory: Address,
    init_code_hash: B256,
    poll_interval: Duration,
}

impl AlloyConnection {
    pub fn connect(config: &ChainConfig) -> Result<Self> {
        let signer: PrivateKeySigner = config.private_key.parse().context("invalid private key")?;
        let signer = signer.with_chain_id(Some(config.chain_id));
        let account = signer.address();
        let wallet = EthereumWallet::from(signer);

        info!("Connecting to {} as {:#x}", config.rpc_url, account);
        let url = config.rpc_url.parse().context("invalid rpc url")?;
        let provider = ProviderBuilder::new().wallet(wallet).on_http(url).erased();

        Ok(Self {
            provider,
            account,
            chain_id: config.chain_id,
            router: config.router,
            factory: config.factory,
            init_code_hash: config.init_code_hash,
            poll_interval: config.poll_interval,
        })
    }
}

#[async_trait]
impl ChainConnection for AlloyConnection {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn account(&self) -> Address {
        self.account
    }

    async fn fetch_pool_state(&self, token_a: Address, token_b: Address) -> Result<Option<RawPoolState>, ChainError> {
        let (token0, token1) = sort_tokens(token_a, token_b);
        let pool = pair_address(self.factory, self.init_code_hash, token0, token1);

        // nothing deployed at the create2 address means the pair was never created
        let code = self.provider.get_code_at(pool).await.map_err(transport_error)?;
        if code.is_empty() {
            debug!("No pair deployed at {:#x}", pool);
            return Ok(None);
        }

        let pair = UniswapV2Pair::new(pool, self.provider.clone());
        let UniswapV2Pair::getReservesReturn { reserve0, reserve1, .. } =
            pair.getReserves().call().await.map_err(contract_error)?;

        Ok(Some(RawPoolState {
            pool,
            token0,
            token1,
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
        }))
    }

    async fn estimate_gas(&self, call: &SwapCallParams) -> Result<u64, ChainError> {
        let router = UniswapV2Router::new(self.router, self.provider.clone());
        router
            .swapExactTokensForTokens(
                call.amount_in,
                call.amount_out_min,
                call.path.clone(),
                call.to,
                U256::from(call.deadline),
            )
            .from(self.account)
            .estimate_gas()
            .await
            .map_err(contract_error)
    }

    async fn submit_transaction(&self, call: &SwapCallParams, gas_limit: u64) -> Result<TxHash, ChainError> {
        let router = UniswapV2Router::new(self.router, self.provider.clone());
        let pending = router
            .swapExactTokensForTokens(
                call.amount_in,
                call.amount_out_min,
                call.path.clone(),
                call.to,
                U256::from(call.deadline),
            )
            .from(self.account)
            .gas(gas_limit)
            .send()
            .await
            .map_err(contract_error)?;
        Ok(*pending.tx_hash())
    }

    // poll for the receipt until it shows up, then end the stream. Failed
    // polls are reported and polling goes on, the caller's timeout bounds it
    fn subscribe_confirmation(&self, tx_hash: TxHash) -> ConfirmationStream {
        let provider = self.provider.clone();
        let poll_interval = self.poll_interval;

        stream::unfold(Some((provider, true)), move |state| async move {
            let (provider, first) = state?;
            if !first {
                tokio::time::sleep(poll_interval).await;
            }
            match provider.get_transaction_receipt(tx_hash).await {
                Ok(None) => Some((Ok(ConfirmationStatus::Pending), Some((provider, false)))),
                Ok(Some(receipt)) => Some((Ok(confirmation_from_receipt(&receipt)), None)),
                Err(err) => {
                    debug!("Receipt poll for {:#x} failed: {}", tx_hash, err);
                    Some((Err(transport_error(err)), Some((provider, false))))
                }
            }
        })
        .boxed()
    }
}

fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Address of the v2 pair for two tokens, derived with create2 the same way
/// the factory deploys it
pub fn pair_address(factory: Address, init_code_hash: B256, token_a: Address, token_b: Address) -> Address {
    let (token0, token1) = sort_tokens(token_a, token_b);
    let salt = keccak256([token0.as_slice(), token1.as_slice()].concat());
    factory.create2(salt, init_code_hash)
}

fn confirmation_from_receipt(receipt: &TransactionReceipt) -> ConfirmationStatus {
    let block_number = receipt.block_number.unwrap_or_default();
    if !receipt.status() {
        return ConfirmationStatus::Reverted { block_number };
    }

    let transfers = receipt
        .inner
        .logs()
        .iter()
        .filter_map(|log| {
            let decoded = log.log_decode::<ERC20::Transfer>().ok()?;
            let ERC20::Transfer { from, to, value } = decoded.inner.data;
            Some(TokenTransfer {
                token: log.address(),
                from,
                to,
                value,
            })
        })
        .collect();
    ConfirmationStatus::Confirmed { block_number, transfers }
}

// an error response means the node understood and refused the request
fn transport_error(err: TransportError) -> ChainError {
    match err {
        RpcError::ErrorResp(payload) => ChainError::Rejected(payload.message.to_string()),
        other => ChainError::Network(other.to_string()),
    }
}

fn contract_error(err: alloy::contract::Error) -> ChainError {
    match err {
        alloy::contract::Error::TransportError(err) => transport_error(err),
        other => ChainError::Rejected(other.to_string()),
    }
}

#[cfg(test)]
mod test_onchain {
    use super::*;
    use crate::config::{UNISWAP_V2_FACTORY, UNISWAP_V2_INIT_CODE_HASH};
    use alloy::primitives::address;
    use alloy::rpc::json_rpc::ErrorPayload;

    #[test]
    fn test_pair_address_matches_mainnet() {
        let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let weth = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        let expected = address!("B4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc");

        assert_eq!(pair_address(UNISWAP_V2_FACTORY, UNISWAP_V2_INIT_CODE_HASH, usdc, weth), expected);
        // order of the inputs does not matter
        assert_eq!(pair_address(UNISWAP_V2_FACTORY, UNISWAP_V2_INIT_CODE_HASH, weth, usdc), expected);
    }

    #[test]
    fn test_error_classification() {
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted: UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT".into(),
            data: None,
        };
        let rejected = transport_error(RpcError::ErrorResp(payload));
        assert!(matches!(rejected, ChainError::Rejected(msg) if msg.contains("INSUFFICIENT_OUTPUT_AMOUNT")));

        let network = transport_error(RpcError::NullResp);
        assert!(matches!(network, ChainError::Network(_)));
    }
}
