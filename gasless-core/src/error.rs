//! Error types for the gasless flow.
//!
//! One error hierarchy built with `thiserror`, shared by every crate in the
//! workspace.

use thiserror::Error;

/// Result type alias using `GaslessError`.
pub type Result<T> = std::result::Result<T, GaslessError>;

/// Main error type for all gasless operations.
#[derive(Debug, Error)]
pub enum GaslessError {
    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Connection timeout.
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    /// Starknet JSON-RPC call failed.
    #[error("RPC call failed: {0}")]
    RpcError(String),

    /// Sponsorship backend answered with a non-success status.
    #[error("Backend error (HTTP {status}): {body}")]
    BackendError {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Value is not a valid Starknet field element.
    #[error("Invalid felt: {0}")]
    InvalidFelt(String),

    /// Response was well-formed JSON but missing an expected field.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // FEE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Gas token price cannot be used for conversion.
    #[error("Invalid gas token price: {0}")]
    InvalidGasTokenPrice(String),

    /// Fee arithmetic overflowed 256 bits.
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),

    // ═══════════════════════════════════════════════════════════════════════════
    // WALLET ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The user rejected the request inside the wallet.
    #[error("Request rejected by wallet: {0}")]
    WalletRejected(String),

    /// The wallet failed for any other reason.
    #[error("Wallet error: {0}")]
    WalletError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GaslessError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        match self {
            GaslessError::HttpError(_)
            | GaslessError::ConnectionTimeout(_)
            | GaslessError::RpcError(_) => true,
            GaslessError::BackendError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the error originated in the wallet.
    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self,
            GaslessError::WalletRejected(_) | GaslessError::WalletError(_)
        )
    }
}
