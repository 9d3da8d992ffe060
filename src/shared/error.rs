//! Error handling for the wallet core
//!
//! This module defines the error types used throughout the wallet core.

use thiserror::Error;

/// Wallet error type
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("No wallet provider is available")]
    ProviderUnavailable,

    #[error("User rejected the request")]
    UserRejected,

    #[error("Wrong network: operation requires {required}, wallet is on {active}")]
    WrongNetwork { required: String, active: String },

    #[error("Network {0} is not known to the wallet provider")]
    UnknownNetwork(String),

    #[error("RPC unavailable: {0}")]
    RpcUnavailable(String),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Create a wrong-network error
    pub fn wrong_network(required: impl Into<String>, active: impl Into<String>) -> Self {
        Self::WrongNetwork {
            required: required.into(),
            active: active.into(),
        }
    }

    /// Create an RPC unavailable error
    pub fn rpc_unavailable(message: impl Into<String>) -> Self {
        Self::RpcUnavailable(message.into())
    }

    /// Create an oracle unavailable error
    pub fn oracle_unavailable(message: impl Into<String>) -> Self {
        Self::OracleUnavailable(message.into())
    }

    /// Create a transaction rejected error
    pub fn transaction_rejected(message: impl Into<String>) -> Self {
        Self::TransactionRejected(message.into())
    }

    /// Create a transaction reverted error
    pub fn transaction_reverted(message: impl Into<String>) -> Self {
        Self::TransactionReverted(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for conditions that end the attempted operation but not the session
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        Self::validation(format!("Hex decoding error: {err}"))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("JSON error: {err}"))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        Self::oracle_unavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WalletError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("Task join error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WalletError::rpc_unavailable("connection refused");
        let display = format!("{error}");

        assert!(display.contains("RPC unavailable"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_wrong_network_display() {
        let error = WalletError::wrong_network("Pyralis Testnet", "NanoPy Turbo");
        let display = format!("{error}");

        assert!(display.contains("Pyralis Testnet"));
        assert!(display.contains("NanoPy Turbo"));
    }

    #[test]
    fn test_error_conversions() {
        let json_error = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let wallet_error: WalletError = json_error.into();

        assert!(matches!(wallet_error, WalletError::Validation(_)));
    }

    #[test]
    fn test_recoverability() {
        assert!(WalletError::UserRejected.is_recoverable());
        assert!(WalletError::rpc_unavailable("x").is_recoverable());
        assert!(!WalletError::internal("x").is_recoverable());
    }
}
