//! In-memory aggregator and node used by the controller and server tests.

use crate::chain::transaction::tests::unsigned_swap_tx;
use crate::chain::{ChainRpc, SignatureState};
use crate::jupiter::tests::SAMPLE_QUOTE;
use crate::jupiter::{
    PriorityLevel, QuoteRequest, QuoteResponse, SwapAggregator, SwapRequest, SwapResponse,
};
use crate::swap::{Referral, SwapSettings};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
pub(crate) struct FakeJupiter {
    pub quotes: Mutex<Vec<QuoteRequest>>,
    pub swaps: Mutex<Vec<SwapRequest>>,
    pub fail_quote: Option<&'static str>,
    /// When set, `swap` parks until notified.
    pub hold: Option<Arc<Notify>>,
}

#[async_trait]
impl SwapAggregator for FakeJupiter {
    fn name(&self) -> String {
        "fake-jupiter".to_string()
    }

    async fn quote(&self, request: &QuoteRequest) -> anyhow::Result<QuoteResponse> {
        self.quotes.lock().unwrap().push(request.clone());
        if let Some(msg) = self.fail_quote {
            return Err(anyhow::anyhow!(msg));
        }
        let mut quote: QuoteResponse = serde_json::from_str(SAMPLE_QUOTE)?;
        quote.input_mint = request.input_mint.clone();
        quote.output_mint = request.output_mint.clone();
        quote.in_amount = request.amount;
        Ok(quote)
    }

    async fn swap(&self, request: &SwapRequest) -> anyhow::Result<SwapResponse> {
        self.swaps.lock().unwrap().push(request.clone());
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        let owner = Pubkey::from_str(&request.user_public_key)?;
        Ok(SwapResponse {
            swap_transaction: unsigned_swap_tx(&owner, false),
            last_valid_block_height: 100,
            prioritization_fee_lamports: Some(1_000),
        })
    }
}

pub(crate) struct FakeNode {
    pub decimals: Option<u8>,
    pub final_state: SignatureState,
    pub sent: Mutex<Vec<VersionedTransaction>>,
}

impl FakeNode {
    pub fn new(decimals: Option<u8>, final_state: SignatureState) -> Self {
        Self {
            decimals,
            final_state,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChainRpc for FakeNode {
    fn name(&self) -> String {
        "fake-node".to_string()
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> anyhow::Result<Signature> {
        if !tx.verify_with_results().iter().all(|ok| *ok) {
            anyhow::bail!("signature verification failed");
        }
        self.sent.lock().unwrap().push(tx.clone());
        Ok(tx.signatures[0])
    }

    async fn signature_state(&self, _signature: &Signature) -> anyhow::Result<SignatureState> {
        Ok(self.final_state.clone())
    }

    async fn token_decimals(&self, _mint: &Pubkey) -> anyhow::Result<u8> {
        self.decimals.ok_or_else(|| anyhow::anyhow!("account not found"))
    }
}

pub(crate) fn settings(referral: Option<Referral>) -> SwapSettings {
    SwapSettings {
        priority_level: PriorityLevel::High,
        referral,
        confirm_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(1),
    }
}
