//! Holder list from on-chain token accounts
//!
//! All token accounts of the mint are fetched (SPL Token or Token-2022,
//! depending on the mint owner) and balances are summed per owner wallet.

use super::HolderListSource;
use crate::analysis::types::{AnalysisContext, Holder};
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use crate::rpc::{ParsedTokenAccount, RpcClient};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RpcHolderListSource {
    client: Arc<RpcClient>,
}

impl RpcHolderListSource {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

/// Sum balances per owner, drop empty accounts, largest holders first
pub fn aggregate_by_owner(accounts: &[ParsedTokenAccount]) -> Vec<Holder> {
    // Per-mint balances never exceed the u64 supply, so the sum cannot overflow.
    let mut balances: HashMap<&str, u64> = HashMap::new();
    for account in accounts.iter().filter(|a| a.amount > 0) {
        let entry = balances.entry(account.owner.as_str()).or_insert(0);
        *entry = entry.saturating_add(account.amount);
    }

    let mut holders: Vec<(&str, u64)> = balances.into_iter().collect();
    holders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    holders
        .into_iter()
        .map(|(owner, amount)| Holder::new(owner, Decimal::from(amount)))
        .collect()
}

#[async_trait]
impl HolderListSource for RpcHolderListSource {
    async fn get_holders(
        &self,
        address: &str,
        context: &AnalysisContext,
    ) -> Result<Vec<Holder>, AnalysisError> {
        let label = context.label();

        let program = self
            .client
            .get_account_owner(&label, address)
            .await?
            .ok_or_else(|| AnalysisError::TokenNotFound {
                address: address.to_string(),
                reason: "mint account does not exist".to_string(),
            })?;

        let accounts = self
            .client
            .get_mint_token_accounts(&label, address, &program)
            .await?;

        let holders = aggregate_by_owner(&accounts);
        logger::debug(
            LogTag::Sources,
            &format!(
                "{} token accounts → {} holders for {}",
                accounts.len(),
                holders.len(),
                address
            ),
        );

        Ok(holders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(address: &str, owner: &str, amount: u64) -> ParsedTokenAccount {
        ParsedTokenAccount {
            address: address.to_string(),
            owner: owner.to_string(),
            mint: "Mint".to_string(),
            amount,
        }
    }

    #[test]
    fn test_aggregate_by_owner() {
        let accounts = vec![
            account("acc1", "WalletA", 100),
            account("acc2", "WalletB", 700),
            account("acc3", "WalletA", 50),
            account("acc4", "WalletC", 0),
        ];

        let holders = aggregate_by_owner(&accounts);
        assert_eq!(
            holders,
            vec![Holder::new("WalletB", 700u64), Holder::new("WalletA", 150u64)]
        );
    }

    #[test]
    fn test_aggregate_ties_are_deterministic() {
        let accounts = vec![account("a", "Zed", 10), account("b", "Amy", 10)];
        let holders = aggregate_by_owner(&accounts);
        assert_eq!(holders[0].address, "Amy");
        assert_eq!(holders[1].address, "Zed");
    }
}
