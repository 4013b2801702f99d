//! Error types for the gateway

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Contract address unset or configuration unreadable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// RPC endpoint unreachable
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Simulation rejected by the contract
    #[error("Contract error during {context}: {reason}")]
    Revert { context: String, reason: String },

    /// JSON-RPC error response that is not a revert
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Return data or log did not match the expected shape
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// No signer attached to the wallet handle
    #[error("Signer error: {0}")]
    Signer(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Submission, confirmation or on-chain execution failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Confirmed receipt lacks an expected log
    #[error("Missing log: {0}")]
    MissingLog(String),
}

impl GatewayError {
    /// Attach the operation name to a revert raised by a lower layer.
    pub(crate) fn in_context(self, context: &str) -> Self {
        match self {
            GatewayError::Revert { reason, .. } => GatewayError::Revert {
                context: context.to_string(),
                reason,
            },
            other => other,
        }
    }

    /// Whether the error came from the transport rather than the contract.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, GatewayError::Connectivity(_))
    }

    /// Decoded revert reason, if this error is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            GatewayError::Revert { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}
