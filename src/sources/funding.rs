//! Funding source lookup
//!
//! The funder of a wallet is whoever sent the SOL in its very first
//! transaction: the oldest signature is located by walking the history
//! backwards, then the parsed transaction is searched for a system
//! `transfer` / `createAccount` crediting the wallet.

use super::{FundingInfo, FundingOracle, WalletRef};
use crate::analysis::types::{AnalysisContext, FundingDetails};
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use crate::rpc::types::{ParsedInstruction, MAX_SIGNATURES_PER_PAGE};
use crate::rpc::{ParsedTransaction, RpcClient, SystemInstruction};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

pub struct RpcFundingOracle {
    client: Arc<RpcClient>,
    max_signature_pages: usize,
    min_funding_lamports: u64,
}

/// System transfer crediting a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingTransfer {
    pub source: String,
    pub lamports: u64,
}

impl RpcFundingOracle {
    pub fn new(client: Arc<RpcClient>, max_signature_pages: usize, min_funding_lamports: u64) -> Self {
        Self {
            client,
            max_signature_pages,
            min_funding_lamports,
        }
    }

    /// Oldest signature of `address`, `None` when there is no history or it is
    /// longer than the page budget
    async fn oldest_signature(
        &self,
        label: &str,
        address: &str,
    ) -> Result<Option<String>, AnalysisError> {
        let mut before: Option<String> = None;

        for _ in 0..self.max_signature_pages {
            let page = self
                .client
                .get_signatures_for_address(label, address, MAX_SIGNATURES_PER_PAGE, before.as_deref())
                .await?;

            let last = match page.last() {
                Some(sig) => sig.signature.clone(),
                None => return Ok(before),
            };

            if page.len() < MAX_SIGNATURES_PER_PAGE {
                return Ok(Some(last));
            }
            before = Some(last);
        }

        logger::debug(
            LogTag::Sources,
            &format!(
                "History of {} exceeds {} pages, funding source skipped",
                address, self.max_signature_pages
            ),
        );
        Ok(None)
    }

    async fn funding_for(&self, label: &str, address: &str) -> Result<FundingInfo, AnalysisError> {
        let signature = match self.oldest_signature(label, address).await? {
            Some(sig) => sig,
            None => return Ok(FundingInfo::default()),
        };

        let transaction = match self.client.get_transaction(label, &signature).await? {
            Some(tx) => tx,
            None => return Ok(FundingInfo::default()),
        };

        let transfer = match find_funding_transfer(&transaction, address, self.min_funding_lamports) {
            Some(transfer) => transfer,
            None => return Ok(FundingInfo::default()),
        };

        let timestamp = transaction
            .block_time
            .and_then(|t| Utc.timestamp_opt(t, 0).single());

        Ok(FundingInfo {
            funder_address: Some(transfer.source),
            funding_details: Some(FundingDetails {
                signature,
                amount_sol: transfer.lamports as f64 / LAMPORTS_PER_SOL,
                timestamp,
            }),
        })
    }
}

fn credited_transfer(instruction: &ParsedInstruction, wallet: &str) -> Option<FundingTransfer> {
    let (source, recipient, lamports) = match instruction.system_instruction()? {
        SystemInstruction::Transfer {
            source,
            destination,
            lamports,
        }
        | SystemInstruction::TransferWithSeed {
            source,
            destination,
            lamports,
        } => (source, destination, lamports),
        SystemInstruction::CreateAccount {
            source,
            new_account,
            lamports,
        }
        | SystemInstruction::CreateAccountWithSeed {
            source,
            new_account,
            lamports,
        } => (source, new_account, lamports),
    };

    if recipient != wallet {
        return None;
    }
    Some(FundingTransfer { source, lamports })
}

/// First system transfer in `transaction` (outer instructions, then inner
/// ones) that credits `wallet` with at least `min_lamports`
pub fn find_funding_transfer(
    transaction: &ParsedTransaction,
    wallet: &str,
    min_lamports: u64,
) -> Option<FundingTransfer> {
    transaction
        .all_instructions()
        .filter_map(|instruction| credited_transfer(instruction, wallet))
        .find(|transfer| transfer.source != wallet && transfer.lamports >= min_lamports)
}

#[async_trait]
impl FundingOracle for RpcFundingOracle {
    async fn analyze_funding(
        &self,
        wallets: &[WalletRef],
        context: &AnalysisContext,
    ) -> Result<Vec<FundingInfo>, AnalysisError> {
        let label = context.label();
        let mut results = Vec::with_capacity(wallets.len());

        for wallet in wallets {
            results.push(self.funding_for(&label, &wallet.address).await?);
        }

        Ok(results)
    }
}
