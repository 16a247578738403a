use alloy::primitives::U256;
use serde::Serialize;

use crate::error::SwapError;
use crate::reserves::PoolReserves;
use crate::token::{decimal_scale, Token, TokenAmount};

// basis point scalar used by the fee multiplier
const BPS_SCALAR: u64 = 10_000;

/// Fee taken by the pool on the input side before pricing.
///
/// `None` prices the swap with the bare constant product formula, `Bps`
/// deducts the fee the way uniswap v2 pairs do (30 bps there).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FeeModel {
    #[default]
    None,
    Bps(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeType {
    ExactInput,
}

/// Result of pricing an exact input swap against a reserve snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub route: Vec<Token>,
    pub trade_type: TradeType,
}

impl Trade {
    pub fn token_in(&self) -> Token {
        self.input.token
    }

    pub fn token_out(&self) -> Token {
        self.output.token
    }
}

/// Tolerated price movement as an exact fraction numerator / denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlippageBound {
    pub numerator: U256,
    pub denominator: U256,
}

impl SlippageBound {
    pub fn from_bps(bps: u32) -> Self {
        Self {
            numerator: U256::from(bps),
            denominator: U256::from(BPS_SCALAR),
        }
    }

    pub fn from_fraction(numerator: U256, denominator: U256) -> Self {
        Self { numerator, denominator }
    }

    // an amount of 0.005 of an 18 decimal token reads as 0.5%
    pub fn from_token_amount(amount: &TokenAmount) -> Result<Self, SwapError> {
        let denominator = decimal_scale(amount.token.decimals)
            .ok_or_else(|| SwapError::InvalidSlippage("token decimals out of range".to_string()))?;
        Ok(Self {
            numerator: amount.raw,
            denominator,
        })
    }

    /// Tolerance must lie strictly between zero and one
    pub fn validate(&self) -> Result<(), SwapError> {
        if self.denominator.is_zero() {
            return Err(SwapError::InvalidSlippage("denominator is zero".to_string()));
        }
        if self.numerator.is_zero() {
            return Err(SwapError::InvalidSlippage("tolerance must be above zero".to_string()));
        }
        if self.numerator >= self.denominator {
            return Err(SwapError::InvalidSlippage("tolerance must be below 100%".to_string()));
        }
        Ok(())
    }
}

impl Default for SlippageBound {
    fn default() -> Self {
        Self::from_bps(50)
    }
}

/// Pure pricing for a single constant product pair
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeCalculator {
    fee: FeeModel,
}

impl TradeCalculator {
    pub fn new(fee: FeeModel) -> Self {
        Self { fee }
    }

    pub fn fee(&self) -> FeeModel {
        self.fee
    }

    // Calculate the amount out for an exact input swap through the pool
    pub fn compute_trade(&self, reserves: &PoolReserves, input: TokenAmount) -> Result<Trade, SwapError> {
        if input.is_zero() {
            return Err(SwapError::InvalidAmount("input amount is zero".to_string()));
        }
        let (reserve_in, reserve_out) = reserves.oriented(&input.token)?;
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(SwapError::InsufficientLiquidity);
        }

        let amount_out = self.amount_out(input.raw, reserve_in.raw, reserve_out.raw)?;
        if amount_out.is_zero() {
            return Err(SwapError::InsufficientInputAmount);
        }

        let token_out = reserve_out.token;
        Ok(Trade {
            input,
            output: TokenAmount::new(token_out, amount_out),
            route: vec![input.token, token_out],
            trade_type: TradeType::ExactInput,
        })
    }

    /// Floor of `output * (1 - tolerance)`, so the bound is never looser
    /// than what was asked for
    pub fn minimum_output(&self, trade: &Trade, slippage: &SlippageBound) -> Result<TokenAmount, SwapError> {
        slippage.validate()?;
        let kept = slippage.denominator - slippage.numerator;
        let min_out = trade
            .output
            .raw
            .checked_mul(kept)
            .ok_or(SwapError::Overflow("minimum output"))?
            / slippage.denominator;
        Ok(TokenAmount::new(trade.output.token, min_out))
    }

    // y = x * rOut / (rIn + x), with the fee applied to x when configured
    fn amount_out(&self, amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256, SwapError> {
        let overflow = || SwapError::Overflow("constant product");
        match self.fee {
            FeeModel::None => {
                let numerator = amount_in.checked_mul(reserve_out).ok_or_else(overflow)?;
                let denominator = reserve_in.checked_add(amount_in).ok_or_else(overflow)?;
                Ok(numerator / denominator)
            }
            FeeModel::Bps(fee) => {
                let fee = U256::from(fee);
                let scalar = U256::from(BPS_SCALAR);
                if fee >= scalar {
                    return Err(SwapError::InvalidAmount("pool fee takes the whole input".to_string()));
                }
                let amount_in_with_fee = amount_in.checked_mul(scalar - fee).ok_or_else(overflow)?;
                let numerator = amount_in_with_fee.checked_mul(reserve_out).ok_or_else(overflow)?;
                let denominator = reserve_in
                    .checked_mul(scalar)
                    .and_then(|r| r.checked_add(amount_in_with_fee))
                    .ok_or_else(overflow)?;
                Ok(numerator / denominator)
            }
        }
    }
}
