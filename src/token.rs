use alloy::primitives::{Address, U256};
use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::error::{SwapError, ValidationError, ValidationReason};

/// An ERC-20 token on a specific chain.
///
/// Equality and hashing only look at the chain id and the address. The
/// address is stored as raw bytes so the textual case it was parsed from
/// plays no part in the comparison.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(chain_id: u64, address: Address, decimals: u8) -> Self {
        Self { chain_id, address, decimals }
    }

    // token0 of a v2 pair is always the lower address
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

/// A raw amount of a token in its smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenAmount {
    pub token: Token,
    pub raw: U256,
}

impl TokenAmount {
    pub fn new(token: Token, raw: U256) -> Self {
        Self { token, raw }
    }

    pub fn zero(token: Token) -> Self {
        Self { token, raw: U256::ZERO }
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    // Parse a human decimal string ("1.5") into the raw unit of the token
    pub fn from_decimal_str(token: Token, value: &str) -> Result<Self, ValidationError> {
        let raw = parse_units(value, token.decimals).map_err(|reason| ValidationError::new("amount", reason))?;
        Ok(Self { token, raw })
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount, SwapError> {
        self.ensure_same_token(other)?;
        let raw = self.raw.checked_add(other.raw).ok_or(SwapError::Overflow("token amount addition"))?;
        Ok(TokenAmount::new(self.token, raw))
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount, SwapError> {
        self.ensure_same_token(other)?;
        let raw = self.raw.checked_sub(other.raw).ok_or(SwapError::Overflow("token amount subtraction"))?;
        Ok(TokenAmount::new(self.token, raw))
    }

    /// Render the amount with the token's decimals, trailing zeros trimmed
    pub fn to_decimal_string(&self) -> String {
        format_units(self.raw, self.token.decimals)
    }

    fn ensure_same_token(&self, other: &TokenAmount) -> Result<(), SwapError> {
        if self.token != other.token {
            return Err(SwapError::TokenMismatch(self.token.address, other.token.address));
        }
        Ok(())
    }
}

// 10^decimals, decimals above 77 cannot be represented in a U256
pub(crate) fn decimal_scale(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Exact decimal string to integer conversion.
///
/// Accepts an optional leading `+`, digits, and at most one `.`. Anything
/// the token cannot represent without rounding is refused.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, ValidationReason> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationReason::Empty);
    }
    if value.starts_with('-') {
        // "-0" is still not a valid amount, report it as negative
        return if is_plain_decimal(&value[1..]) {
            Err(ValidationReason::Negative)
        } else {
            Err(ValidationReason::NotNumeric)
        };
    }
    let value = value.strip_prefix('+').unwrap_or(value);
    if !is_plain_decimal(value) {
        return Err(ValidationReason::NotNumeric);
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };

    // zeros past the token precision carry no value and are allowed
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(ValidationReason::TooManyDecimals);
    }

    let scale = decimal_scale(decimals).ok_or(ValidationReason::Overflow)?;
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| ValidationReason::Overflow)?
    };
    let fraction_raw = if fraction.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| ValidationReason::Overflow)?
    };

    let raw = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_raw))
        .ok_or(ValidationReason::Overflow)?;
    if raw.is_zero() {
        return Err(ValidationReason::Zero);
    }
    Ok(raw)
}

fn is_plain_decimal(value: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in value.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Integer to decimal string, the inverse of [`parse_units`]
pub fn format_units(raw: U256, decimals: u8) -> String {
    let Some(scale) = decimal_scale(decimals) else {
        return raw.to_string();
    };
    if decimals == 0 {
        return raw.to_string();
    }
    let whole = raw / scale;
    let fraction = raw % scale;
    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    let trimmed = fraction.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}
