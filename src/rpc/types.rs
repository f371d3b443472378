//! Typed views over the JSON-RPC responses used by the analysis
//!
//! Parsing is kept separate from transport so it can be tested on fixtures.

use crate::errors::RpcError;
use serde::Deserialize;
use serde_json::Value;

pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

/// Standard SPL token account size (Token-2022 accounts vary with extensions)
pub const SPL_TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Maximum page size accepted by getSignaturesForAddress
pub const MAX_SIGNATURES_PER_PAGE: usize = 1000;

/// Token supply information from getTokenSupply
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSupply {
    /// Total supply in raw base units
    pub amount: u64,
    pub decimals: u8,
}

/// Information about a transaction signature from getSignaturesForAddress
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Block time as Unix timestamp
    pub block_time: Option<i64>,
    pub failed: bool,
}

/// jsonParsed token account (from getProgramAccounts or getTokenAccountsByOwner)
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTokenAccount {
    pub address: String,
    pub owner: String,
    pub mint: String,
    /// Raw base units
    pub amount: u64,
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcValue<T> {
    value: T,
}

/// `{ amount, decimals }` as returned for supplies and token balances
#[derive(Debug, Deserialize)]
struct UiTokenAmount {
    amount: String,
    #[serde(default)]
    decimals: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureEntry {
    signature: String,
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountEnvelope,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    data: AccountData,
}

/// jsonParsed data, or the `[data, encoding]` pair the node falls back to
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountData {
    Json { parsed: ParsedAccountData },
    Encoded(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    owner: String,
    #[serde(default)]
    mint: String,
    token_amount: UiTokenAmount,
}

/// jsonParsed transaction from getTransaction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    #[serde(default)]
    pub transaction: TransactionBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructionSet>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InnerInstructionSet {
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

/// One instruction; `parsed` is an object for known programs, a plain string
/// for some (memo), and absent when the node could not decode it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
}

/// System program instructions that move lamports into an account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "info", rename_all = "camelCase")]
pub enum SystemInstruction {
    Transfer {
        source: String,
        destination: String,
        lamports: u64,
    },
    TransferWithSeed {
        source: String,
        destination: String,
        lamports: u64,
    },
    CreateAccount {
        source: String,
        #[serde(rename = "newAccount")]
        new_account: String,
        lamports: u64,
    },
    CreateAccountWithSeed {
        source: String,
        #[serde(rename = "newAccount")]
        new_account: String,
        lamports: u64,
    },
}

impl ParsedTransaction {
    /// Outer instructions followed by every inner instruction, in order
    pub fn all_instructions(&self) -> impl Iterator<Item = &ParsedInstruction> {
        let inner = self
            .meta
            .iter()
            .flat_map(|meta| meta.inner_instructions.iter().flatten())
            .flat_map(|set| set.instructions.iter());

        self.transaction.message.instructions.iter().chain(inner)
    }
}

impl ParsedInstruction {
    pub fn is_system(&self) -> bool {
        self.program.as_deref() == Some("system")
            || self.program_id.as_deref() == Some(SYSTEM_PROGRAM_ID)
    }

    /// Decoded system instruction; `None` for other programs and for system
    /// instructions that do not credit lamports (advanceNonce, assign, ...)
    pub fn system_instruction(&self) -> Option<SystemInstruction> {
        if !self.is_system() {
            return None;
        }
        SystemInstruction::deserialize(self.parsed.as_ref()?).ok()
    }
}

// =============================================================================
// Parsers
// =============================================================================

fn decode<'a, T: Deserialize<'a>>(method: &str, value: &'a Value) -> Result<T, RpcError> {
    T::deserialize(value).map_err(|e| RpcError::malformed(method, e.to_string()))
}

fn parse_amount(method: &str, amount: &str) -> Result<u64, RpcError> {
    amount
        .parse::<u64>()
        .map_err(|e| RpcError::malformed(method, format!("invalid amount: {}", e)))
}

pub fn parse_token_supply(result: &Value) -> Result<TokenSupply, RpcError> {
    let supply: RpcValue<UiTokenAmount> = decode("getTokenSupply", result)?;

    Ok(TokenSupply {
        amount: parse_amount("getTokenSupply", &supply.value.amount)?,
        decimals: supply.value.decimals,
    })
}

pub fn parse_signatures(result: &Value) -> Result<Vec<SignatureInfo>, RpcError> {
    let entries: Vec<RpcSignatureEntry> = decode("getSignaturesForAddress", result)?;

    Ok(entries
        .into_iter()
        .map(|entry| SignatureInfo {
            signature: entry.signature,
            slot: entry.slot,
            block_time: entry.block_time,
            failed: entry.err.is_some(),
        })
        .collect())
}

fn token_account_from(method: &str, keyed: KeyedAccount) -> Result<ParsedTokenAccount, RpcError> {
    let info = match keyed.account.data {
        AccountData::Json { parsed } => parsed.info,
        AccountData::Encoded(_) => {
            return Err(RpcError::malformed(method, "account is not jsonParsed"));
        }
    };

    Ok(ParsedTokenAccount {
        address: keyed.pubkey,
        amount: parse_amount(method, &info.token_amount.amount)?,
        owner: info.owner,
        mint: info.mint,
    })
}

/// getProgramAccounts returns a bare array
pub fn parse_program_token_accounts(result: &Value) -> Result<Vec<ParsedTokenAccount>, RpcError> {
    let method = "getProgramAccounts";
    let items: Vec<KeyedAccount> = decode(method, result)?;
    items
        .into_iter()
        .map(|item| token_account_from(method, item))
        .collect()
}

/// getTokenAccountsByOwner wraps the array in `{ context, value }`
pub fn parse_owner_token_accounts(result: &Value) -> Result<Vec<ParsedTokenAccount>, RpcError> {
    let method = "getTokenAccountsByOwner";
    let items: RpcValue<Vec<KeyedAccount>> = decode(method, result)?;
    items
        .value
        .into_iter()
        .map(|item| token_account_from(method, item))
        .collect()
}

/// getTransaction result; `null` means the node no longer has it
pub fn parse_transaction(result: &Value) -> Result<Option<ParsedTransaction>, RpcError> {
    if result.is_null() {
        return Ok(None);
    }
    decode("getTransaction", result).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_token_supply() {
        let result = json!({
            "context": { "slot": 1 },
            "value": { "amount": "1000000000000000", "decimals": 6, "uiAmount": 1000000000.0 }
        });
        let supply = parse_token_supply(&result).unwrap();
        assert_eq!(supply.amount, 1_000_000_000_000_000);
        assert_eq!(supply.decimals, 6);
    }

    #[test]
    fn test_parse_token_supply_rejects_bad_amount() {
        let result = json!({ "value": { "amount": "-1", "decimals": 6 } });
        assert!(matches!(
            parse_token_supply(&result),
            Err(RpcError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_signatures() {
        let result = json!([
            { "signature": "sigA", "slot": 10, "blockTime": 1700000000, "err": null },
            { "signature": "sigB", "slot": 9, "blockTime": null, "err": { "InstructionError": [0, "Custom"] } }
        ]);
        let sigs = parse_signatures(&result).unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].block_time, Some(1_700_000_000));
        assert!(!sigs[0].failed);
        assert_eq!(sigs[1].block_time, None);
        assert!(sigs[1].failed);
    }

    #[test]
    fn test_parse_owner_token_accounts() {
        let result = json!({
            "context": { "slot": 5 },
            "value": [{
                "pubkey": "AtaAddress",
                "account": { "data": { "parsed": { "info": {
                    "owner": "WalletAddress",
                    "mint": "MintAddress",
                    "tokenAmount": { "amount": "2500", "decimals": 6 }
                }}}}
            }]
        });
        let accounts = parse_owner_token_accounts(&result).unwrap();
        assert_eq!(
            accounts,
            vec![ParsedTokenAccount {
                address: "AtaAddress".to_string(),
                owner: "WalletAddress".to_string(),
                mint: "MintAddress".to_string(),
                amount: 2500,
            }]
        );
    }

    #[test]
    fn test_parse_transaction_instructions() {
        let result = json!({
            "blockTime": 1700000000,
            "meta": {
                "err": null,
                "innerInstructions": [{
                    "index": 0,
                    "instructions": [{
                        "program": "system",
                        "programId": SYSTEM_PROGRAM_ID,
                        "parsed": { "type": "advanceNonce", "info": { "nonceAccount": "N" } }
                    }]
                }]
            },
            "transaction": { "message": { "instructions": [
                { "programId": "Unknown111", "accounts": [], "data": "3Bxs" },
                {
                    "program": "system",
                    "programId": SYSTEM_PROGRAM_ID,
                    "parsed": {
                        "type": "createAccountWithSeed",
                        "info": { "source": "Payer", "newAccount": "Wallet", "base": "B", "seed": "s", "lamports": 42, "space": 0, "owner": "O" }
                    }
                }
            ]}}
        });

        let tx = parse_transaction(&result).unwrap().unwrap();
        assert_eq!(tx.block_time, Some(1_700_000_000));

        let decoded: Vec<Option<SystemInstruction>> =
            tx.all_instructions().map(|i| i.system_instruction()).collect();
        assert_eq!(
            decoded,
            vec![
                None,
                Some(SystemInstruction::CreateAccountWithSeed {
                    source: "Payer".to_string(),
                    new_account: "Wallet".to_string(),
                    lamports: 42,
                }),
                None,
            ]
        );

        assert!(parse_transaction(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_parse_program_accounts_requires_parsed_data() {
        let result = json!([{ "pubkey": "X", "account": { "data": ["AAAA", "base64"] } }]);
        assert!(parse_program_token_accounts(&result).is_err());
    }
}
