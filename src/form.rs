use crate::constants::{
    DEFAULT_PRIORITY_FEE, DEFAULT_SLIPPAGE, LAMPORTS_PER_MICRO_SOL, MAX_SLIPPAGE_PERCENT,
    MIN_SLIPPAGE_PERCENT, USDC_MINT,
};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// SOL -> token
    #[default]
    Buy,
    /// token -> SOL
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Private key is required")]
    MissingPrivateKey,
    #[error("Token mint address is required")]
    MissingTokenMint,
    #[error("Amount must be greater than 0")]
    AmountNotPositive,
    #[error("Amount is too large")]
    AmountTooLarge,
    #[error("Slippage must be at least 0.1%")]
    SlippageTooLow,
    #[error("Slippage must be at most 50%")]
    SlippageTooHigh,
    #[error("Priority fee must be at least 0")]
    PriorityFeeNegative,
    #[error("Priority fee is too large")]
    PriorityFeeTooLarge,
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid token mint address: {0}")]
    InvalidTokenMint(String),
}

/// Raw form fields as the user typed them.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapForm {
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub token_mint: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub slippage: String,
    #[serde(default)]
    pub priority_fee: String,
    #[serde(default)]
    pub side: Side,
}

impl Default for SwapForm {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            token_mint: USDC_MINT.to_string(),
            amount: String::new(),
            slippage: DEFAULT_SLIPPAGE.to_string(),
            priority_fee: DEFAULT_PRIORITY_FEE.to_string(),
            side: Side::Buy,
        }
    }
}

// The key must never end up in logs.
impl fmt::Debug for SwapForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapForm")
            .field("private_key", &"<redacted>")
            .field("token_mint", &self.token_mint)
            .field("amount", &self.amount)
            .field("slippage", &self.slippage)
            .field("priority_fee", &self.priority_fee)
            .field("side", &self.side)
            .finish()
    }
}

pub struct SwapOrder {
    pub keypair: Keypair,
    pub side: Side,
    pub token_mint: Pubkey,
    pub amount: UiAmount,
    pub slippage_bps: u16,
    pub max_priority_lamports: u64,
}

impl SwapForm {
    pub fn validate(&self) -> Result<SwapOrder, ValidationError> {
        let private_key = self.private_key.trim();
        if private_key.is_empty() {
            return Err(ValidationError::MissingPrivateKey);
        }

        let token_mint = self.token_mint.trim();
        if token_mint.is_empty() {
            return Err(ValidationError::MissingTokenMint);
        }

        let amount = UiAmount::parse(&self.amount).ok_or(ValidationError::AmountNotPositive)?;

        let slippage: f64 = self
            .slippage
            .trim()
            .parse()
            .map_err(|_| ValidationError::SlippageTooLow)?;
        if !slippage.is_finite() || slippage < MIN_SLIPPAGE_PERCENT {
            return Err(ValidationError::SlippageTooLow);
        }
        if slippage > MAX_SLIPPAGE_PERCENT {
            return Err(ValidationError::SlippageTooHigh);
        }

        let max_priority_lamports = parse_priority_fee(&self.priority_fee)?;

        let keypair = parse_private_key(private_key)?;
        let token_mint = Pubkey::from_str(token_mint)
            .map_err(|e| ValidationError::InvalidTokenMint(e.to_string()))?;

        Ok(SwapOrder {
            keypair,
            side: self.side,
            token_mint,
            amount,
            slippage_bps: percent_to_bps(slippage),
            max_priority_lamports,
        })
    }
}

pub fn percent_to_bps(percent: f64) -> u16 {
    (percent * 100.0).round() as u16
}

/// Whole micro-SOL in, lamport cap out.
fn parse_priority_fee(input: &str) -> Result<u64, ValidationError> {
    let input = input.trim();
    let digits = input.strip_prefix('+').unwrap_or(input);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PriorityFeeNegative);
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(|fee| fee.checked_mul(LAMPORTS_PER_MICRO_SOL))
        .ok_or(ValidationError::PriorityFeeTooLarge)
}

/// Accepts a base58 keypair (wallet export) or a JSON byte array (solana-keygen file contents).
pub fn parse_private_key(input: &str) -> Result<Keypair, ValidationError> {
    let bytes = if input.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(input)
            .map_err(|e| ValidationError::InvalidPrivateKey(e.to_string()))?
    } else {
        bs58::decode(input)
            .into_vec()
            .map_err(|e| ValidationError::InvalidPrivateKey(e.to_string()))?
    };

    if bytes.len() != 64 {
        return Err(ValidationError::InvalidPrivateKey(format!(
            "expected 64 bytes, got {}",
            bytes.len()
        )));
    }

    Keypair::from_bytes(&bytes).map_err(|e| ValidationError::InvalidPrivateKey(e.to_string()))
}

/// A positive decimal amount in UI units, kept as digits so scaling to base units is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiAmount {
    whole: String,
    frac: String,
}

impl UiAmount {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !whole.chars().chain(frac.chars()).any(|c| c != '0') {
            return None;
        }

        Some(Self {
            whole: whole.trim_start_matches('0').to_string(),
            frac: frac.trim_end_matches('0').to_string(),
        })
    }

    /// Digits past `decimals` are dropped.
    pub fn to_base_units(&self, decimals: u8) -> Result<u64, ValidationError> {
        let decimals = decimals as usize;
        let mut digits = self.whole.clone();
        digits.extend(self.frac.chars().take(decimals));
        digits.extend(std::iter::repeat('0').take(decimals.saturating_sub(self.frac.len())));

        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Err(ValidationError::AmountNotPositive);
        }
        digits.parse().map_err(|_| ValidationError::AmountTooLarge)
    }
}

impl fmt::Display for UiAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = if self.whole.is_empty() { "0" } else { &self.whole };
        if self.frac.is_empty() {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{}", whole, self.frac)
        }
    }
}

/// Formats base units back into a UI string, trimming trailing zeros.
/// Works on the digit string, so any mint precision is accepted.
pub fn format_base_units(units: u64, decimals: u8) -> String {
    let decimals = decimals as usize;
    let digits = format!("{:0>width$}", units, width = decimals + 1);
    let (whole, frac) = digits.split_at(digits.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}
