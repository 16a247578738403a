use alloy::primitives::{Address, TxHash};
use chrono::Utc;
use futures::StreamExt;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;

use crate::calculation::TradeCalculator;
use crate::chain::{ChainConnection, ConfirmationStatus, TokenTransfer};
use crate::config::SwapConfig;
use crate::error::{ChainError, SwapError};
use crate::events::{ReceiptStatus, SnapshotData, SwapReceipt, SwapSnapshot, SwapState};
use crate::request::SwapRequest;
use crate::reserves::PairReserveOracle;
use crate::swap::{build_swap_call, estimate_gas};
use crate::token::{Token, TokenAmount};

// slack on top of the on-chain deadline before the local wait gives up,
// roughly one block to let a last second inclusion show up
const DEADLINE_GRACE: Duration = Duration::from_secs(15);

/// A failed attempt, with the step it failed in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("swap failed while {step}: {error}")]
pub struct SwapFailure {
    pub step: SwapState,
    pub error: SwapError,
    // set once the transaction reached the network, for manual lookup
    pub tx_hash: Option<TxHash>,
}

/// Drives one swap attempt from request to receipt.
///
/// An executor runs exactly one attempt: [`SwapExecutor::execute`] consumes
/// it. Retrying means building a new executor, which forces fresh reserves
/// and a fresh deadline.
pub struct SwapExecutor<C: ChainConnection + ?Sized> {
    connection: Arc<C>,
    config: SwapConfig,
    state: SwapState,
    tx_hash: Option<TxHash>,
    updates: Option<UnboundedSender<SwapSnapshot>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<C: ChainConnection + ?Sized> SwapExecutor<C> {
    pub fn new(connection: Arc<C>, config: SwapConfig) -> Self {
        Self {
            connection,
            config,
            state: SwapState::Idle,
            tx_hash: None,
            updates: None,
            cancel: None,
        }
    }

    // Stream every transition to the presentation layer
    pub fn with_updates(mut self, updates: UnboundedSender<SwapSnapshot>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Flipping the flag to `true` stops the attempt. Before submission
    /// nothing is sent, once pending only local tracking stops.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn execute(mut self, request: &SwapRequest) -> Result<SwapReceipt, SwapFailure> {
        match self.run(request).await {
            Ok(receipt) => Ok(receipt),
            Err(error) => Err(self.fail(error)),
        }
    }

    async fn run(&mut self, request: &SwapRequest) -> Result<SwapReceipt, SwapError> {
        self.transition(SwapState::Validating, None);
        let swap = request.validate(self.connection.chain_id())?;
        let recipient = swap.recipient.unwrap_or_else(|| self.connection.account());
        let deadline_offset = swap.deadline_offset.unwrap_or(self.config.default_deadline);

        // price the trade against a fresh snapshot
        self.transition(SwapState::Quoting, None);
        let reserves = PairReserveOracle::new(self.connection.as_ref())
            .fetch_reserves(&swap.from_token, &swap.to_token)
            .await?;
        let calculator = TradeCalculator::new(self.config.fee);
        let trade = calculator.compute_trade(&reserves, swap.amount_in)?;
        let min_out = calculator.minimum_output(&trade, &swap.slippage)?;
        info!(
            "Quoted {} -> {} (min {}) via pool {:#x}",
            trade.input.to_decimal_string(),
            trade.output.to_decimal_string(),
            min_out.to_decimal_string(),
            reserves.pool
        );

        self.transition(
            SwapState::Building,
            Some(SnapshotData::Quote {
                trade: trade.clone(),
                min_out,
            }),
        );
        let call = build_swap_call(&trade, &min_out, recipient, deadline_offset)?;

        self.transition(SwapState::Estimating, Some(SnapshotData::Call(call.clone())));
        let gas = estimate_gas(self.connection.as_ref(), &call).await?;

        if self.is_cancelled() {
            return Err(SwapError::Cancelled { tx_hash: None });
        }
        self.transition(SwapState::Submitting, Some(SnapshotData::Gas(gas)));
        let tx_hash = match self.connection.submit_transaction(&call, gas.gas_limit).await {
            Ok(tx_hash) => tx_hash,
            Err(ChainError::Rejected(reason)) => return Err(SwapError::Submission(reason)),
            Err(err) => return Err(err.into()),
        };
        self.tx_hash = Some(tx_hash);
        info!("Swap submitted: {:#x}", tx_hash);

        self.transition(SwapState::Pending, Some(SnapshotData::Submitted { tx_hash }));
        let receipt = self
            .await_confirmation(tx_hash, call.deadline, swap.to_token, recipient)
            .await?;

        info!("Swap {:#x} confirmed in block {:?}", tx_hash, receipt.block_number);
        self.transition(SwapState::Confirmed, Some(SnapshotData::Receipt(receipt.clone())));
        Ok(receipt)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        deadline: u64,
        token_out: Token,
        recipient: Address,
    ) -> Result<SwapReceipt, SwapError> {
        let timeout = self.wait_timeout(deadline);
        debug!("Waiting up to {:?} for {:#x}", timeout, tx_hash);

        let mut updates = self.connection.subscribe_confirmation(tx_hash);
        let watch_receipt = async move {
            while let Some(status) = updates.next().await {
                // the transaction is out, a failed poll is no reason to report it as retryable
                let status = match status {
                    Ok(status) => status,
                    Err(err) => {
                        warn!("Receipt poll for {:#x} failed: {}", tx_hash, err);
                        continue;
                    }
                };
                match status {
                    ConfirmationStatus::Pending => debug!("{:#x} still pending", tx_hash),
                    ConfirmationStatus::Confirmed { block_number, transfers } => {
                        return realized_output(&transfers, token_out, recipient).map(|amount_out| SwapReceipt {
                            tx_hash,
                            status: ReceiptStatus::Confirmed,
                            block_number: Some(block_number),
                            amount_out,
                        });
                    }
                    ConfirmationStatus::Reverted { block_number } => {
                        warn!("Swap {:#x} reverted in block {}", tx_hash, block_number);
                        return Err(SwapError::TransactionReverted { tx_hash });
                    }
                }
            }
            warn!("Confirmation updates for {:#x} ended early, waiting out the deadline", tx_hash);
            std::future::pending::<Result<SwapReceipt, SwapError>>().await
        };

        let mut cancel = self.cancel.clone();
        tokio::select! {
            result = tokio::time::timeout(timeout, watch_receipt) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(SwapError::DeadlineExceeded { tx_hash, deadline }),
            },
            _ = cancelled(&mut cancel) => {
                info!("Stopped tracking {:#x} on request, transaction stays on the network", tx_hash);
                Err(SwapError::Cancelled { tx_hash: Some(tx_hash) })
            }
        }
    }

    // local wait never outlives the on-chain deadline by more than the grace period
    fn wait_timeout(&self, deadline: u64) -> Duration {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let until_deadline = Duration::from_secs(deadline.saturating_sub(now)) + DEADLINE_GRACE;
        self.config.confirmation_timeout.min(until_deadline)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow())
    }

    fn transition(&mut self, state: SwapState, data: Option<SnapshotData>) {
        debug!("Swap state {} -> {}", self.state, state);
        self.state = state;
        self.emit(SwapSnapshot { state, data, error: None });
    }

    fn fail(&mut self, error: SwapError) -> SwapFailure {
        let step = self.state;
        warn!("Swap failed while {}: {}", step, error);
        self.state = SwapState::Failed;
        self.emit(SwapSnapshot {
            state: SwapState::Failed,
            data: self.tx_hash.map(|tx_hash| SnapshotData::Submitted { tx_hash }),
            error: Some(error.clone()),
        });
        SwapFailure {
            step,
            error,
            tx_hash: self.tx_hash,
        }
    }

    fn emit(&self, snapshot: SwapSnapshot) {
        if let Some(updates) = &self.updates {
            if updates.send(snapshot).is_err() {
                debug!("Snapshot receiver dropped");
            }
        }
    }
}

// Sum what the recipient actually got of the output token
fn realized_output(
    transfers: &[TokenTransfer],
    token_out: Token,
    recipient: Address,
) -> Result<Option<TokenAmount>, SwapError> {
    let mut total: Option<TokenAmount> = None;
    for transfer in transfers
        .iter()
        .filter(|t| t.token == token_out.address && t.to == recipient)
    {
        let amount = TokenAmount::new(token_out, transfer.value);
        total = Some(match total {
            Some(sum) => sum.checked_add(&amount)?,
            None => amount,
        });
    }
    Ok(total)
}

// Resolves once the cancel flag is set, never if there is no flag
async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    let Some(cancel) = cancel else {
        return std::future::pending().await;
    };
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // sender gone, the flag can never flip
            return std::future::pending().await;
        }
    }
}
