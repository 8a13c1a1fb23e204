use crate::form::ValidationError;

use solana_sdk::signature::Signature;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(String),

    /// `signature` is set once the transaction reached the network.
    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
        signature: Option<Signature>,
    },

    #[error("A swap is already in progress")]
    Busy,
}

impl SwapError {
    pub fn transaction(message: impl Into<String>) -> Self {
        SwapError::Transaction {
            message: message.into(),
            signature: None,
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        match self {
            SwapError::Transaction { signature, .. } => *signature,
            _ => None,
        }
    }

    /// Stage label used by the failure counter.
    pub fn stage(&self) -> &'static str {
        match self {
            SwapError::Validation(_) => "validation",
            SwapError::Api(_) => "api",
            SwapError::Transaction { .. } => "transaction",
            SwapError::Busy => "busy",
        }
    }
}

pub type SwapResult<T> = Result<T, SwapError>;
