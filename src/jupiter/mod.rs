pub mod client;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use client::JupiterClient;

use async_trait::async_trait;

/// Route finding and transaction building, delegated to the aggregator.
#[async_trait]
pub trait SwapAggregator: Sync + Send {
    fn name(&self) -> String;

    async fn quote(&self, request: &QuoteRequest) -> anyhow::Result<QuoteResponse>;

    async fn swap(&self, request: &SwapRequest) -> anyhow::Result<SwapResponse>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    pub only_direct_routes: bool,
    pub restrict_intermediate_tokens: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_fee_bps: Option<u16>,
}

impl QuoteRequest {
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            only_direct_routes: false,
            restrict_intermediate_tokens: true,
            platform_fee_bps: None,
        }
    }
}

/// Quote as returned by `/quote`. Fields not modelled here are carried in `extra`
/// so the quote goes back to `/swap` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    #[serde(with = "string_u64")]
    pub in_amount: u64,
    pub output_mint: String,
    #[serde(with = "string_u64")]
    pub out_amount: u64,
    #[serde(with = "string_u64")]
    pub other_amount_threshold: u64,
    #[serde(default)]
    pub swap_mode: String,
    #[serde(default)]
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: String,
    #[serde(default)]
    pub route_plan: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteResponse {
    pub fn route_labels(&self) -> String {
        let labels: Vec<&str> = self
            .route_plan
            .iter()
            .filter_map(|step| step.pointer("/swapInfo/label").and_then(Value::as_str))
            .collect();

        if labels.is_empty() {
            "Direct".to_string()
        } else {
            labels.join(" → ")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityLevel {
    Medium,
    #[default]
    High,
    VeryHigh,
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityLevel::Medium => write!(f, "medium"),
            PriorityLevel::High => write!(f, "high"),
            PriorityLevel::VeryHigh => write!(f, "veryHigh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFee {
    pub priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityLevelWithMaxLamports {
    pub max_lamports: u64,
    pub priority_level: PriorityLevel,
}

impl PrioritizationFee {
    pub fn capped(max_lamports: u64, priority_level: PriorityLevel) -> Self {
        Self {
            priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                max_lamports,
                priority_level,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub quote_response: QuoteResponse,
    pub user_public_key: String,
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_compute_unit_limit: bool,
    pub prioritization_fee_lamports: PrioritizationFee,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<String>,
}

impl SwapRequest {
    pub fn new(quote_response: QuoteResponse, user_public_key: String, fee: PrioritizationFee) -> Self {
        Self {
            quote_response,
            user_public_key,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: fee,
            fee_account: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// base64 wire transaction, unsigned
    pub swap_transaction: String,
    #[serde(default)]
    pub last_valid_block_height: u64,
    #[serde(default)]
    pub prioritization_fee_lamports: Option<u64>,
}

/// Jupiter encodes token amounts as decimal strings.
mod string_u64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_QUOTE: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "inAmount": "100000000",
        "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        "outAmount": "14520311",
        "otherAmountThreshold": "14375108",
        "swapMode": "ExactIn",
        "slippageBps": 100,
        "platformFee": null,
        "priceImpactPct": "0.0001",
        "routePlan": [
            {"swapInfo": {"ammKey": "a", "label": "Whirlpool", "inputMint": "x", "outputMint": "y"}, "percent": 100},
            {"swapInfo": {"ammKey": "b", "label": "Raydium CLMM", "inputMint": "y", "outputMint": "z"}, "percent": 100}
        ],
        "contextSlot": 301234567,
        "timeTaken": 0.012
    }"#;

    #[test]
    fn test_quote_keeps_unknown_fields() {
        let quote: QuoteResponse = serde_json::from_str(SAMPLE_QUOTE).unwrap();
        assert_eq!(quote.in_amount, 100_000_000);
        assert_eq!(quote.out_amount, 14_520_311);
        assert_eq!(quote.other_amount_threshold, 14_375_108);
        assert_eq!(quote.route_labels(), "Whirlpool → Raydium CLMM");

        let back = serde_json::to_value(&quote).unwrap();
        assert_eq!(back["inAmount"], "100000000");
        assert_eq!(back["contextSlot"], 301234567);
        assert!(back["platformFee"].is_null());
        assert!(back.get("platformFee").is_some());
    }

    #[test]
    fn test_route_labels_direct_when_empty() {
        let mut quote: QuoteResponse = serde_json::from_str(SAMPLE_QUOTE).unwrap();
        quote.route_plan.clear();
        assert_eq!(quote.route_labels(), "Direct");
    }

    #[test]
    fn test_swap_request_shape() {
        let quote: QuoteResponse = serde_json::from_str(SAMPLE_QUOTE).unwrap();
        let request = SwapRequest::new(
            quote,
            "wallet".to_string(),
            PrioritizationFee::capped(5_000, PriorityLevel::High),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["userPublicKey"], "wallet");
        assert_eq!(json["dynamicComputeUnitLimit"], true);
        assert_eq!(json["wrapAndUnwrapSol"], true);
        assert_eq!(
            json["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["maxLamports"],
            5_000
        );
        assert_eq!(
            json["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["priorityLevel"],
            "high"
        );
        assert!(json.get("feeAccount").is_none());
        assert_eq!(json["quoteResponse"]["outAmount"], "14520311");
    }

    #[test]
    fn test_priority_level_names() {
        let level: PriorityLevel = serde_json::from_str("\"veryHigh\"").unwrap();
        assert_eq!(level, PriorityLevel::VeryHigh);
        assert_eq!(level.to_string(), "veryHigh");
    }
}
