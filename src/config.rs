use crate::constants::{
    DEFAULT_PRIORITY_FEE, DEFAULT_SLIPPAGE, JUPITER_API_ENDPOINT, SOLANA_RPC_ENDPOINT, USDC_MINT,
};
use crate::jupiter::PriorityLevel;
use crate::swap::{Referral, SwapSettings};

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("referral: {0}")]
    Referral(String),
    #[error("server.bind `{0}` is not a socket address")]
    Bind(String),
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct QuickTradeArgs {
    pub rpc_url: String,
    /// Usually supplied through `PRIVATE_KEY` instead of the file.
    pub private_key: Option<String>,
    pub jupiter: JupiterConfig,
    pub defaults: FormDefaults,
    pub referral: ReferralConfig,
    pub confirmation: ConfirmationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub priority_level: PriorityLevel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub token_mint: String,
    pub slippage: String,
    pub priority_fee: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReferralConfig {
    pub fee_bps: u16,
    pub fee_account: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for QuickTradeArgs {
    fn default() -> Self {
        Self {
            rpc_url: SOLANA_RPC_ENDPOINT.to_string(),
            private_key: None,
            jupiter: JupiterConfig::default(),
            defaults: FormDefaults::default(),
            referral: ReferralConfig::default(),
            confirmation: ConfirmationConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            base_url: JUPITER_API_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 15,
            priority_level: PriorityLevel::High,
        }
    }
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            token_mint: USDC_MINT.to_string(),
            slippage: DEFAULT_SLIPPAGE.to_string(),
            priority_fee: DEFAULT_PRIORITY_FEE.to_string(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

impl fmt::Debug for QuickTradeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickTradeArgs")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("jupiter", &self.jupiter.base_url)
            .field("defaults", &self.defaults)
            .field("referral", &self.referral)
            .field("confirmation", &self.confirmation)
            .field("server", &self.server)
            .finish()
    }
}

impl QuickTradeArgs {
    /// Loads `path`, or `config.yaml` when present, then applies environment overrides.
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let mut args = if path.exists() || required {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_yaml(&content).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Self::default()
        };

        args.apply_env(|key| std::env::var(key).ok());
        args.referral()?;
        args.bind_addr()?;
        Ok(args)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = set("PRIVATE_KEY") {
            self.private_key = Some(v);
        }
        if let Some(v) = set("RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = set("JUPITER_URL") {
            self.jupiter.base_url = v;
        }
        if let Some(v) = set("JUPITER_API_KEY") {
            self.jupiter.api_key = Some(v);
        }
    }

    pub fn referral(&self) -> Result<Option<Referral>, ConfigError> {
        match (self.referral.fee_bps, self.referral.fee_account.as_deref()) {
            (0, None) => Ok(None),
            (0, Some(_)) => Err(ConfigError::Referral(
                "fee_account is set but fee_bps is 0".to_string(),
            )),
            (_, None) => Err(ConfigError::Referral(
                "fee_bps is set but fee_account is missing".to_string(),
            )),
            (fee_bps, Some(account)) => {
                if fee_bps > 10_000 {
                    return Err(ConfigError::Referral(format!("fee_bps {} exceeds 10000", fee_bps)));
                }
                let fee_account = Pubkey::from_str(account)
                    .map_err(|e| ConfigError::Referral(format!("fee_account: {}", e)))?;
                Ok(Some(Referral { fee_bps, fee_account }))
            }
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::Bind(self.server.bind.clone()))
    }

    pub fn jupiter_timeout(&self) -> Duration {
        Duration::from_secs(self.jupiter.timeout_secs)
    }

    pub fn swap_settings(&self) -> Result<SwapSettings, ConfigError> {
        Ok(SwapSettings {
            priority_level: self.jupiter.priority_level,
            referral: self.referral()?,
            confirm_timeout: Duration::from_secs(self.confirmation.timeout_secs),
            poll_interval: Duration::from_millis(self.confirmation.poll_interval_ms),
        })
    }
}
