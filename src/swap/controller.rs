use crate::chain::transaction::{decode_swap_transaction, sign_swap_transaction};
use crate::chain::{await_confirmation, ChainRpc};
use crate::constants::{SOL_DECIMALS, WSOL_MINT};
use crate::error::{SwapError, SwapResult};
use crate::form::{Side, SwapForm, SwapOrder};
use crate::jupiter::{PrioritizationFee, QuoteRequest, QuoteResponse, SwapAggregator, SwapRequest};
use crate::metrics::{QUOTES_REQUESTED, SWAP_FAILURE, SWAP_SUCCESS};
use crate::swap::{QuoteSummary, SwapReceipt, SwapSettings};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SwapController {
    pub aggregator: Arc<dyn SwapAggregator>,
    pub rpc: Arc<dyn ChainRpc>,
    pub settings: SwapSettings,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the swap ends, whichever way it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct PricedOrder {
    quote: QuoteResponse,
    summary: QuoteSummary,
}

impl SwapController {
    pub fn new(aggregator: Arc<dyn SwapAggregator>, rpc: Arc<dyn ChainRpc>, settings: SwapSettings) -> Self {
        Self {
            aggregator,
            rpc,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> SwapResult<InFlight> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SwapError::Busy)?;
        Ok(InFlight(self.in_flight.clone()))
    }

    /// Validate, quote, build, sign, submit and confirm. One swap at a time.
    pub async fn execute(&self, form: &SwapForm) -> SwapResult<SwapReceipt> {
        let _guard = self.begin()?;

        let result = self.run(form).await;
        match &result {
            Ok(receipt) => {
                SWAP_SUCCESS.inc();
                info!("Swap confirmed: {}", receipt.signature);
            }
            Err(e) => {
                SWAP_FAILURE.with_label_values(&[e.stage()]).inc();
                warn!("Swap failed: {}", e);
            }
        }
        result
    }

    /// Dry run: validation and a quote, nothing is signed.
    pub async fn quote(&self, form: &SwapForm) -> SwapResult<QuoteSummary> {
        let order = form.validate()?;
        let priced = self.price(&order).await?;
        Ok(priced.summary)
    }

    async fn run(&self, form: &SwapForm) -> SwapResult<SwapReceipt> {
        let order = form.validate()?;
        let owner = order.keypair.pubkey();

        let priced = self.price(&order).await?;

        info!("Creating swap transaction...");
        let mut request = SwapRequest::new(
            priced.quote,
            owner.to_string(),
            PrioritizationFee::capped(order.max_priority_lamports, self.settings.priority_level),
        );
        if let Some(referral) = &self.settings.referral {
            request.fee_account = Some(referral.fee_account.to_string());
        }

        let swap = self
            .aggregator
            .swap(&request)
            .await
            .map_err(|e| SwapError::Api(format!("{:#}", e)))?;
        debug!(
            "Swap transaction created, last valid block height {}, priority fee {:?}",
            swap.last_valid_block_height, swap.prioritization_fee_lamports
        );

        let tx = decode_swap_transaction(&swap.swap_transaction)
            .and_then(|tx| sign_swap_transaction(tx, &order.keypair))
            .map_err(|e| SwapError::transaction(format!("{:#}", e)))?;

        info!("Transaction signed, sending to network via {}...", self.rpc.name());
        let signature = self
            .rpc
            .send_transaction(&tx)
            .await
            .map_err(|e| SwapError::transaction(format!("{:#}", e)))?;
        info!("Transaction sent: {}", signature);

        info!("Waiting for confirmation...");
        await_confirmation(
            self.rpc.as_ref(),
            &signature,
            self.settings.confirm_timeout,
            self.settings.poll_interval,
        )
        .await
        .map_err(|e| SwapError::Transaction {
            message: e.to_string(),
            signature: Some(signature),
        })?;

        Ok(SwapReceipt {
            signature,
            quote: priced.summary,
        })
    }

    async fn price(&self, order: &SwapOrder) -> SwapResult<PricedOrder> {
        let (input_mint, output_mint, in_decimals, out_decimals) = match order.side {
            Side::Buy => {
                let out_decimals = self.decimals_hint(&order.token_mint).await;
                (WSOL_MINT, order.token_mint, SOL_DECIMALS, out_decimals)
            }
            Side::Sell => {
                let in_decimals = self
                    .rpc
                    .token_decimals(&order.token_mint)
                    .await
                    .map_err(|e| SwapError::Api(format!("could not read token decimals: {:#}", e)))?;
                (order.token_mint, WSOL_MINT, in_decimals, Some(SOL_DECIMALS))
            }
        };

        let amount = order.amount.to_base_units(in_decimals)?;

        let mut request = QuoteRequest::new(
            input_mint.to_string(),
            output_mint.to_string(),
            amount,
            order.slippage_bps,
        );
        if let Some(referral) = &self.settings.referral {
            request.platform_fee_bps = Some(referral.fee_bps);
        }

        info!(
            "Getting quote from {}: {} {} -> {}",
            self.aggregator.name(),
            order.amount,
            order.side,
            order.token_mint
        );
        QUOTES_REQUESTED.inc();
        let quote = self
            .aggregator
            .quote(&request)
            .await
            .map_err(|e| SwapError::Api(format!("{:#}", e)))?;

        info!(
            "Quote received: in {} out {} threshold {}",
            quote.in_amount, quote.out_amount, quote.other_amount_threshold
        );

        let summary = QuoteSummary::new(&quote, in_decimals, out_decimals);
        Ok(PricedOrder { quote, summary })
    }

    /// Output decimals only affect display, so a failed lookup is not fatal.
    async fn decimals_hint(&self, mint: &Pubkey) -> Option<u8> {
        match self.rpc.token_decimals(mint).await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("Could not read decimals for {}: {:#}", mint, e);
                None
            }
        }
    }
}
