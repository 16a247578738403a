use alloy::primitives::Address;
use std::time::Duration;

use crate::calculation::SlippageBound;
use crate::error::{SwapError, ValidationError, ValidationReason};
use crate::token::{Token, TokenAmount};

/// A swap as entered by the user, nothing here is trusted yet
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub from_token: String,
    pub from_decimals: u8,
    pub to_token: String,
    pub to_decimals: u8,
    pub amount: String,
    pub slippage: SlippageBound,
    // defaults to the connected account
    pub recipient: Option<String>,
    // falls back to the executor's configured deadline
    pub deadline_offset: Option<Duration>,
}

impl SwapRequest {
    pub fn new(from_token: impl Into<String>, to_token: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            from_token: from_token.into(),
            from_decimals: 18,
            to_token: to_token.into(),
            to_decimals: 18,
            amount: amount.into(),
            slippage: SlippageBound::default(),
            recipient: None,
            deadline_offset: None,
        }
    }

    pub fn with_decimals(mut self, from_decimals: u8, to_decimals: u8) -> Self {
        self.from_decimals = from_decimals;
        self.to_decimals = to_decimals;
        self
    }

    pub fn with_slippage(mut self, slippage: SlippageBound) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_deadline_offset(mut self, offset: Duration) -> Self {
        self.deadline_offset = Some(offset);
        self
    }

    /// Check every field against `chain_id` without touching the network
    pub fn validate(&self, chain_id: u64) -> Result<ValidatedSwap, SwapError> {
        let from = parse_address("from_token", &self.from_token)?;
        let to = parse_address("to_token", &self.to_token)?;
        if from == to {
            return Err(ValidationError::new("to_token", ValidationReason::IdenticalTokens).into());
        }
        let recipient = match &self.recipient {
            Some(recipient) => Some(parse_address("recipient", recipient)?),
            None => None,
        };

        let from_token = Token::new(chain_id, from, self.from_decimals);
        let to_token = Token::new(chain_id, to, self.to_decimals);
        let amount_in = TokenAmount::from_decimal_str(from_token, &self.amount)?;
        self.slippage.validate()?;

        Ok(ValidatedSwap {
            from_token,
            to_token,
            amount_in,
            slippage: self.slippage,
            recipient,
            deadline_offset: self.deadline_offset,
        })
    }
}

/// Output of [`SwapRequest::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSwap {
    pub from_token: Token,
    pub to_token: Token,
    pub amount_in: TokenAmount,
    pub slippage: SlippageBound,
    pub recipient: Option<Address>,
    pub deadline_offset: Option<Duration>,
}

// Parse a hex address, enforcing the eip-55 checksum on mixed case input
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Empty));
    }
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(ValidationError::new(field, ValidationReason::MalformedAddress))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new(field, ValidationReason::MalformedAddress));
    }

    // alloy only reads a lowercase prefix
    let normalized = format!("0x{}", hex);
    let mixed_case = hex.chars().any(|c| c.is_ascii_uppercase()) && hex.chars().any(|c| c.is_ascii_lowercase());
    if mixed_case {
        return Address::parse_checksummed(&normalized, None)
            .map_err(|_| ValidationError::new(field, ValidationReason::BadChecksum));
    }
    normalized
        .parse::<Address>()
        .map_err(|_| ValidationError::new(field, ValidationReason::MalformedAddress))
}
