//! JSON-RPC client
//!
//! Every request is routed through the shared [`RateLimitedGate`]; the
//! `context` argument labels the caller for gate statistics.

use super::rate_limiter::RateLimitedGate;
use super::types::{
    parse_owner_token_accounts, parse_program_token_accounts, parse_signatures,
    parse_token_supply, parse_transaction, ParsedTokenAccount, ParsedTransaction, SignatureInfo,
    TokenSupply, SPL_TOKEN_ACCOUNT_SIZE, SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID,
};
use crate::config::Config;
use crate::errors::RpcError;
use crate::logger::{self, LogTag};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    gate: Arc<RateLimitedGate>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str, timeout: Duration, gate: Arc<RateLimitedGate>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Http {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: url.to_string(),
            timeout,
            gate,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RpcError> {
        let gate = Arc::new(RateLimitedGate::new(&config.rate_limit));
        Self::new(
            &config.rpc.url,
            Duration::from_secs(config.rpc.request_timeout_secs),
            gate,
        )
    }

    pub fn gate(&self) -> &Arc<RateLimitedGate> {
        &self.gate
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw JSON-RPC call through the gate; returns the `result` member
    pub async fn call(&self, context: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        let result = self.gate.enqueue(context, self.send(method, params)).await;
        if let Err(e) = &result {
            if e.is_rate_limited() {
                logger::warning(
                    LogTag::RateLimit,
                    &format!("{} rate limited by upstream ({}): {}", method, context, e),
                );
            }
        }
        result
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        logger::verbose(LogTag::Rpc, &format!("→ {} #{} {}", method, id, body["params"]));

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let status = response.status();
        if !status.is_success() {
            logger::debug(
                LogTag::Rpc,
                &format!("{} #{} returned HTTP {}", method, id, status.as_u16()),
            );
            return Err(RpcError::Status {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        extract_result(method, payload)
    }

    fn transport_error(&self, method: &str, error: reqwest::Error) -> RpcError {
        if error.is_timeout() {
            RpcError::Timeout {
                method: method.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RpcError::Http {
                endpoint: self.url.clone(),
                message: error.to_string(),
            }
        }
    }

    // =========================================================================
    // Token methods
    // =========================================================================

    pub async fn get_token_supply(&self, context: &str, mint: &str) -> Result<TokenSupply, RpcError> {
        let result = self
            .call(context, "getTokenSupply", json!([mint, { "commitment": "confirmed" }]))
            .await?;
        parse_token_supply(&result)
    }

    /// Owner program of the mint account, `None` when the account does not exist
    pub async fn get_account_owner(&self, context: &str, address: &str) -> Result<Option<String>, RpcError> {
        let result = self
            .call(
                context,
                "getAccountInfo",
                json!([address, {
                    "encoding": "base64",
                    "dataSlice": { "offset": 0, "length": 0 },
                    "commitment": "confirmed"
                }]),
            )
            .await?;

        match result.get("value") {
            Some(Value::Null) | None => Ok(None),
            Some(value) => value
                .get("owner")
                .and_then(|o| o.as_str())
                .map(|o| Some(o.to_string()))
                .ok_or_else(|| RpcError::malformed("getAccountInfo", "missing owner")),
        }
    }

    /// All token accounts of a mint (jsonParsed), for either token program
    pub async fn get_mint_token_accounts(
        &self,
        context: &str,
        mint: &str,
        token_program: &str,
    ) -> Result<Vec<ParsedTokenAccount>, RpcError> {
        let filters = if token_program == TOKEN_2022_PROGRAM_ID {
            // Token-2022 accounts can have variable sizes due to extensions
            json!([{ "memcmp": { "offset": 0, "bytes": mint } }])
        } else {
            json!([
                { "dataSize": SPL_TOKEN_ACCOUNT_SIZE },
                { "memcmp": { "offset": 0, "bytes": mint } }
            ])
        };

        let program = if token_program == TOKEN_2022_PROGRAM_ID {
            TOKEN_2022_PROGRAM_ID
        } else {
            SPL_TOKEN_PROGRAM_ID
        };

        let result = self
            .call(
                context,
                "getProgramAccounts",
                json!([program, {
                    "encoding": "jsonParsed",
                    "filters": filters,
                    "commitment": "confirmed"
                }]),
            )
            .await?;

        parse_program_token_accounts(&result)
    }

    pub async fn get_token_accounts_by_owner(
        &self,
        context: &str,
        owner: &str,
        mint: &str,
    ) -> Result<Vec<ParsedTokenAccount>, RpcError> {
        let result = self
            .call(
                context,
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed", "commitment": "confirmed" }]),
            )
            .await?;
        parse_owner_token_accounts(&result)
    }

    // =========================================================================
    // Transaction history methods
    // =========================================================================

    /// One page of signatures, newest first
    pub async fn get_signatures_for_address(
        &self,
        context: &str,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let mut config = serde_json::Map::new();
        config.insert("limit".to_string(), json!(limit));
        config.insert("commitment".to_string(), json!("confirmed"));
        if let Some(before_sig) = before {
            config.insert("before".to_string(), json!(before_sig));
        }

        let result = self
            .call(
                context,
                "getSignaturesForAddress",
                json!([address, Value::Object(config)]),
            )
            .await?;
        parse_signatures(&result)
    }

    /// jsonParsed transaction, `None` when the node no longer has it
    pub async fn get_transaction(
        &self,
        context: &str,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, RpcError> {
        let result = self
            .call(
                context,
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "maxSupportedTransactionVersion": 0,
                    "commitment": "confirmed"
                }]),
            )
            .await?;
        parse_transaction(&result)
    }
}

/// Unwraps a JSON-RPC envelope into its `result`, or maps the `error` member
pub fn extract_result(method: &str, mut payload: Value) -> Result<Value, RpcError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        return Err(RpcError::Rpc {
            method: method.to_string(),
            code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
            message: error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    match payload.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(RpcError::malformed(method, "missing result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_result() {
        let payload = json!({ "jsonrpc": "2.0", "id": 1, "result": { "value": 5 } });
        assert_eq!(extract_result("m", payload).unwrap(), json!({ "value": 5 }));
    }

    #[test]
    fn test_extract_null_result() {
        let payload = json!({ "jsonrpc": "2.0", "id": 1, "result": null });
        assert_eq!(extract_result("getTransaction", payload).unwrap(), Value::Null);
    }

    #[test]
    fn test_extract_error() {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32005, "message": "Node is behind" }
        });
        let err = extract_result("getTokenSupply", payload).unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "RPC error -32005 on getTokenSupply: Node is behind");
    }

    #[test]
    fn test_missing_result_is_malformed() {
        let payload = json!({ "jsonrpc": "2.0", "id": 1 });
        assert!(matches!(
            extract_result("getSlot", payload),
            Err(RpcError::MalformedResponse { .. })
        ));
    }
}
