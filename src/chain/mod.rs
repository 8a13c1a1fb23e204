pub mod confirmation;
pub mod solana_rpc;
pub mod transaction;

pub use confirmation::{await_confirmation, ConfirmationError};
pub use solana_rpc::SolanaRpc;

use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the node or below the target commitment.
    Pending,
    Confirmed,
    Failed(String),
}

/// Submission and status queries, delegated to the RPC node.
#[async_trait]
pub trait ChainRpc: Sync + Send {
    fn name(&self) -> String;

    async fn send_transaction(&self, tx: &VersionedTransaction) -> anyhow::Result<Signature>;

    async fn signature_state(&self, signature: &Signature) -> anyhow::Result<SignatureState>;

    async fn token_decimals(&self, mint: &Pubkey) -> anyhow::Result<u8>;
}
