pub mod controller;
#[cfg(test)]
pub(crate) mod testkit;

pub use controller::SwapController;

use crate::constants::SOLSCAN_TX_URL;
use crate::form::format_base_units;
use crate::jupiter::{PriorityLevel, QuoteResponse};

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Referral {
    pub fee_bps: u16,
    pub fee_account: Pubkey,
}

#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub priority_level: PriorityLevel,
    pub referral: Option<Referral>,
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

/// What a quote means for the user, amounts already scaled when decimals are known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    pub min_out_amount: String,
    pub price_impact_pct: String,
    pub slippage_bps: u16,
    pub route: String,
}

impl QuoteSummary {
    pub fn new(quote: &QuoteResponse, in_decimals: u8, out_decimals: Option<u8>) -> Self {
        let out = |units: u64| match out_decimals {
            Some(d) => format_base_units(units, d),
            None => format!("{} (base units)", units),
        };

        Self {
            input_mint: quote.input_mint.clone(),
            output_mint: quote.output_mint.clone(),
            in_amount: format_base_units(quote.in_amount, in_decimals),
            out_amount: out(quote.out_amount),
            min_out_amount: out(quote.other_amount_threshold),
            price_impact_pct: quote.price_impact_pct.clone(),
            slippage_bps: quote.slippage_bps,
            route: quote.route_labels(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "In:           {} ({})\n\
             Out:          {} ({})\n\
             Min out:      {} (slippage {:.2}%)\n\
             Price impact: {}%\n\
             Route:        {}",
            self.in_amount,
            self.input_mint,
            self.out_amount,
            self.output_mint,
            self.min_out_amount,
            self.slippage_bps as f64 / 100.0,
            self.price_impact_pct,
            self.route,
        )
    }
}

#[derive(Debug, Clone)]
pub struct SwapReceipt {
    pub signature: Signature,
    pub quote: QuoteSummary,
}

impl SwapReceipt {
    pub fn success_message(&self) -> String {
        format!("Swap executed successfully! Transaction signature: {}", self.signature)
    }

    pub fn explorer_url(&self) -> String {
        explorer_url(&self.signature)
    }
}

pub fn explorer_url(signature: &Signature) -> String {
    format!("{}/{}", SOLSCAN_TX_URL, signature)
}
