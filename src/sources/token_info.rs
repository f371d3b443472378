//! Token metadata source: supply/decimals from RPC, symbol/name from DexScreener

use super::TokenInfoSource;
use crate::analysis::types::{AnalysisContext, TokenInfo};
use crate::config::MetadataConfig;
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use crate::rpc::types::{SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID};
use crate::rpc::RpcClient;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
pub const UNKNOWN_NAME: &str = "Unknown Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
}

pub struct RpcTokenInfoSource {
    client: Arc<RpcClient>,
    http: reqwest::Client,
    dexscreener_url: String,
}

impl RpcTokenInfoSource {
    pub fn new(client: Arc<RpcClient>, config: &MetadataConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            http,
            dexscreener_url: config.dexscreener_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_metadata(&self, mint: &str) -> Result<Option<TokenMetadata>, String> {
        let url = format!("{}/{}", self.dexscreener_url, mint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("DexScreener request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("DexScreener returned HTTP {}", response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("DexScreener response is not JSON: {}", e))?;

        Ok(parse_dexscreener_metadata(&body, mint))
    }
}

/// Finds the mint among the base/quote tokens of the returned pairs
pub fn parse_dexscreener_metadata(body: &Value, mint: &str) -> Option<TokenMetadata> {
    let pairs = body.get("pairs")?.as_array()?;

    pairs.iter().find_map(|pair| {
        ["baseToken", "quoteToken"].iter().find_map(|side| {
            let token = pair.get(*side)?;
            if token.get("address")?.as_str()? != mint {
                return None;
            }
            Some(TokenMetadata {
                symbol: token.get("symbol")?.as_str()?.to_string(),
                name: token.get("name")?.as_str()?.to_string(),
            })
        })
    })
}

#[async_trait]
impl TokenInfoSource for RpcTokenInfoSource {
    async fn get_token_info(
        &self,
        address: &str,
        context: &AnalysisContext,
    ) -> Result<TokenInfo, AnalysisError> {
        let label = context.label();
        let not_found = |reason: String| AnalysisError::TokenNotFound {
            address: address.to_string(),
            reason,
        };

        let owner = self
            .client
            .get_account_owner(&label, address)
            .await
            .map_err(|e| not_found(e.to_string()))?
            .ok_or_else(|| not_found("mint account does not exist".to_string()))?;

        if owner != SPL_TOKEN_PROGRAM_ID && owner != TOKEN_2022_PROGRAM_ID {
            return Err(not_found(format!("account is owned by {}, not a token program", owner)));
        }

        let supply = self
            .client
            .get_token_supply(&label, address)
            .await
            .map_err(|e| not_found(e.to_string()))?;

        let metadata = match self.fetch_metadata(address).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                logger::debug(
                    LogTag::Sources,
                    &format!("No DexScreener pairs for {}, using placeholder metadata", address),
                );
                TokenMetadata {
                    symbol: UNKNOWN_SYMBOL.to_string(),
                    name: UNKNOWN_NAME.to_string(),
                }
            }
            Err(e) => {
                logger::warning(
                    LogTag::Sources,
                    &format!("Metadata lookup failed for {}: {}", address, e),
                );
                TokenMetadata {
                    symbol: UNKNOWN_SYMBOL.to_string(),
                    name: UNKNOWN_NAME.to_string(),
                }
            }
        };

        Ok(TokenInfo {
            address: address.to_string(),
            symbol: metadata.symbol,
            name: metadata.name,
            decimals: supply.decimals,
            total_supply: supply.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata_from_quote_side() {
        let body = json!({
            "pairs": [{
                "baseToken": { "address": "So11111111111111111111111111111111111111112", "name": "Wrapped SOL", "symbol": "SOL" },
                "quoteToken": { "address": "MintX", "name": "Example", "symbol": "EXM" }
            }]
        });
        assert_eq!(
            parse_dexscreener_metadata(&body, "MintX"),
            Some(TokenMetadata {
                symbol: "EXM".to_string(),
                name: "Example".to_string()
            })
        );
    }

    #[test]
    fn test_parse_metadata_without_pairs() {
        assert_eq!(parse_dexscreener_metadata(&json!({ "pairs": null }), "MintX"), None);
        assert_eq!(parse_dexscreener_metadata(&json!({ "pairs": [] }), "MintX"), None);
    }
}
