/// RPC transport and protocol errors
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("HTTP error calling {endpoint}: {message}")]
    Http { endpoint: String, message: String },

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("RPC error {code} on {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Malformed {method} response: {reason}")]
    MalformedResponse { method: String, reason: String },

    #[error("{method} timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },
}

impl RpcError {
    pub fn malformed(method: &str, reason: impl Into<String>) -> Self {
        RpcError::MalformedResponse {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    /// 429 or JSON-RPC rate-limit codes
    pub fn is_rate_limited(&self) -> bool {
        match self {
            RpcError::Status { status, .. } => *status == 429,
            RpcError::Rpc { code, message, .. } => {
                *code == 429 || *code == -32005 || message.to_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }
}
