//! Client configuration: sponsorship backend and Starknet RPC.

use serde::{Deserialize, Serialize};

use gasless_core::constants::{
    DEFAULT_PRICE_POLL_INTERVAL_SECS, DEFAULT_REWARDS_PROTOCOL, DEFAULT_TIMEOUT_SECS,
    GASLESS_MAINNET_BASE_URL, GASLESS_SEPOLIA_BASE_URL, STARKNET_MAINNET_RPC_URL,
    STARKNET_SEPOLIA_RPC_URL,
};
use gasless_core::error::{GaslessError, Result};

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn check_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| GaslessError::ConfigError(format!("invalid URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(GaslessError::ConfigError(format!(
            "unsupported URL scheme '{other}' in '{url}'"
        ))),
    }
}

/// Sponsorship backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaslessConfig {
    /// Backend base URL (without the `/gasless/v1` prefix)
    pub base_url: String,
    /// Optional API key sent in the `api-key` header
    pub api_key: Option<String>,
    /// Protocol tag used for reward queries
    pub rewards_protocol: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Interval between gas-token price fetches
    pub price_poll_interval_seconds: u64,
}

impl Default for GaslessConfig {
    fn default() -> Self {
        Self {
            base_url: GASLESS_MAINNET_BASE_URL.into(),
            api_key: None,
            rewards_protocol: DEFAULT_REWARDS_PROTOCOL.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            price_poll_interval_seconds: DEFAULT_PRICE_POLL_INTERVAL_SECS,
        }
    }
}

impl GaslessConfig {
    /// Creates a configuration for the given backend URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Mainnet backend.
    pub fn mainnet() -> Self {
        Self::default()
    }

    /// Sepolia backend.
    pub fn sepolia() -> Self {
        Self::new(GASLESS_SEPOLIA_BASE_URL)
    }

    /// Adds an API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Loads configuration from the environment (and `.env` if present).
    ///
    /// Reads `GASLESS_TESTNET`, `GASLESS_BASE_URL`, `GASLESS_API_KEY` and
    /// `GASLESS_PRICE_POLL_SECS`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = if env_flag("GASLESS_TESTNET") {
            Self::sepolia()
        } else {
            Self::mainnet()
        };
        if let Ok(url) = std::env::var("GASLESS_BASE_URL") {
            config.base_url = url;
        }
        config.api_key = std::env::var("GASLESS_API_KEY").ok().filter(|k| !k.is_empty());
        if let Some(secs) = std::env::var("GASLESS_PRICE_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.price_poll_interval_seconds = secs;
        }
        config
    }

    /// Checks the configuration before use.
    pub fn validate(&self) -> Result<()> {
        check_url(&self.base_url)?;
        if self.price_poll_interval_seconds == 0 {
            return Err(GaslessError::ConfigError(
                "price poll interval must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

/// Starknet JSON-RPC configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StarknetRpcConfig {
    /// Node RPC URL
    pub rpc_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for StarknetRpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: STARKNET_MAINNET_RPC_URL.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl StarknetRpcConfig {
    /// Creates a configuration with the given RPC URL.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    /// Public Sepolia node.
    pub fn sepolia() -> Self {
        Self::new(STARKNET_SEPOLIA_RPC_URL)
    }

    /// Loads configuration from `STARKNET_RPC_URL` / `GASLESS_TESTNET`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        match std::env::var("STARKNET_RPC_URL") {
            Ok(url) => Self::new(url),
            Err(_) if env_flag("GASLESS_TESTNET") => Self::sepolia(),
            Err(_) => Self::default(),
        }
    }

    /// Checks the configuration before use.
    pub fn validate(&self) -> Result<()> {
        check_url(&self.rpc_url)
    }
}
