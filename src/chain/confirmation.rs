use crate::chain::{ChainRpc, SignatureState};

use solana_sdk::signature::Signature;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfirmationError {
    #[error("Transaction failed: {0}")]
    Failed(String),
    #[error("Transaction was not confirmed within {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Polls the node until `signature` is confirmed, fails on-chain, or `timeout` elapses.
/// Status-query errors are retried until the deadline.
pub async fn await_confirmation(
    rpc: &dyn ChainRpc,
    signature: &Signature,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), ConfirmationError> {
    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        polls += 1;
        match rpc.signature_state(signature).await {
            Ok(SignatureState::Confirmed) => {
                info!("Transaction {} confirmed after {} ms", signature, start.elapsed().as_millis());
                return Ok(());
            }
            Ok(SignatureState::Failed(err)) => {
                warn!("Transaction {} failed: {}", signature, err);
                return Err(ConfirmationError::Failed(err));
            }
            Ok(SignatureState::Pending) => {
                debug!("Transaction {} pending (poll {})", signature, polls);
            }
            Err(e) => {
                warn!("Status query for {} failed: {:?}", signature, e);
            }
        }

        if start.elapsed() >= timeout {
            return Err(ConfirmationError::TimedOut(timeout));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
