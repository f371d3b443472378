/// Structured error types for supplyscan
///
/// `AnalysisError` is what the top-level analysis rejects with. Cancellation
/// is a distinct variant so callers can tell "user aborted" from "system failure".
use thiserror::Error;

pub mod rpc;
pub use rpc::RpcError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Analysis cancelled ({stage})")]
    Cancelled { stage: String },

    #[error("Token {address} not found: {reason}")]
    TokenNotFound { address: String, reason: String },

    #[error("Token {address} reports a zero total supply")]
    InvalidTokenSupply { address: String },

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{source_name} failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    #[error("Wallet analysis panicked: {0}")]
    Panicked(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn cancelled(stage: impl Into<String>) -> Self {
        AnalysisError::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn from_source(source_name: &str, message: impl Into<String>) -> Self {
        AnalysisError::Source {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinct() {
        let cancelled = AnalysisError::cancelled("before batch 3");
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.to_string(), "Analysis cancelled (before batch 3)");

        let not_found = AnalysisError::TokenNotFound {
            address: "Mint".to_string(),
            reason: "account does not exist".to_string(),
        };
        assert!(!not_found.is_cancelled());
    }

    #[test]
    fn test_rpc_error_conversion() {
        let err: AnalysisError = RpcError::Status {
            endpoint: "http://localhost".to_string(),
            status: 429,
        }
        .into();
        assert!(!err.is_cancelled());
        match err {
            AnalysisError::Rpc(inner) => assert!(inner.is_rate_limited()),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
