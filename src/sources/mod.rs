//! External collaborators of the analysis pipeline
//!
//! The pipeline only talks to these traits. RPC/HTTP-backed implementations
//! live in the submodules; tests plug in in-memory fakes.

use crate::analysis::types::{AnalysisContext, FundingDetails, Holder, TokenInfo};
use crate::errors::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod activity;
pub mod funding;
pub mod holders;
pub mod inactivity;
pub mod token_info;

pub use activity::RpcActivityOracle;
pub use funding::RpcFundingOracle;
pub use holders::RpcHolderListSource;
pub use inactivity::RpcInactivityOracle;
pub use token_info::RpcTokenInfoSource;

#[async_trait]
pub trait TokenInfoSource: Send + Sync {
    /// Fails with `TokenNotFound` when the mint is unknown
    async fn get_token_info(
        &self,
        address: &str,
        context: &AnalysisContext,
    ) -> Result<TokenInfo, AnalysisError>;
}

#[async_trait]
pub trait HolderListSource: Send + Sync {
    async fn get_holders(
        &self,
        address: &str,
        context: &AnalysisContext,
    ) -> Result<Vec<Holder>, AnalysisError>;
}

#[async_trait]
pub trait ActivityOracle: Send + Sync {
    /// Number of signatures for `address`, counted up to `limit`
    async fn get_signature_count(
        &self,
        address: &str,
        limit: usize,
        context: &AnalysisContext,
    ) -> Result<usize, AnalysisError>;
}

/// Provenance verdicts reported by the inactivity oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InactivityCategory {
    /// Wallet has no token account for the mint
    NoToken,
    /// Token account exists but never had a transaction
    NoAtaTransaction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactivityReport {
    pub category: Option<InactivityCategory>,
    pub is_inactive: bool,
    pub days_since_last_activity: Option<u32>,
}

#[async_trait]
pub trait InactivityOracle: Send + Sync {
    async fn check_inactivity(
        &self,
        wallet_address: &str,
        token_address: &str,
        context: &AnalysisContext,
    ) -> Result<InactivityReport, AnalysisError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRef {
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingInfo {
    pub funder_address: Option<String>,
    pub funding_details: Option<FundingDetails>,
}

#[async_trait]
pub trait FundingOracle: Send + Sync {
    /// One entry per input wallet, same order
    async fn analyze_funding(
        &self,
        wallets: &[WalletRef],
        context: &AnalysisContext,
    ) -> Result<Vec<FundingInfo>, AnalysisError>;
}

/// Base58 check for a 32-byte account address
pub fn validate_address(address: &str) -> Result<(), AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(e.to_string()))?;

    if bytes.len() != 32 {
        return Err(invalid(format!("expected 32 bytes, got {}", bytes.len())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1").is_ok());
        assert!(validate_address("11111111111111111111111111111111").is_ok());
        assert!(matches!(
            validate_address("not-base58!"),
            Err(AnalysisError::InvalidAddress { .. })
        ));
        assert!(validate_address("abc").is_err());
    }
}
