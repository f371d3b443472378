//! Inactivity / provenance oracle
//!
//! Looks at the wallet's token account(s) for the mint:
//! - no account at all → `NoToken`
//! - account(s) without any signature → `NoAtaTransaction`
//! - otherwise the newest signature decides how long the holding sat idle

use super::{InactivityCategory, InactivityOracle, InactivityReport};
use crate::analysis::types::AnalysisContext;
use crate::errors::AnalysisError;
use crate::rpc::RpcClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct RpcInactivityOracle {
    client: Arc<RpcClient>,
    inactive_after_days: u32,
}

impl RpcInactivityOracle {
    pub fn new(client: Arc<RpcClient>, inactive_after_days: u32) -> Self {
        Self {
            client,
            inactive_after_days,
        }
    }
}

/// Latest activity seen on the wallet's token accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountActivity {
    NoAccount,
    NoTransactions,
    /// Newest signature's block time, when the node reported one
    LastSeen(Option<i64>),
}

pub fn days_since(now: DateTime<Utc>, block_time: i64) -> u32 {
    let elapsed = now.timestamp() - block_time;
    if elapsed <= 0 {
        0
    } else {
        (elapsed / 86_400) as u32
    }
}

pub fn build_report(
    activity: AccountActivity,
    now: DateTime<Utc>,
    inactive_after_days: u32,
) -> InactivityReport {
    match activity {
        AccountActivity::NoAccount => InactivityReport {
            category: Some(InactivityCategory::NoToken),
            ..Default::default()
        },
        AccountActivity::NoTransactions => InactivityReport {
            category: Some(InactivityCategory::NoAtaTransaction),
            ..Default::default()
        },
        AccountActivity::LastSeen(None) => InactivityReport::default(),
        AccountActivity::LastSeen(Some(block_time)) => {
            let days = days_since(now, block_time);
            InactivityReport {
                category: None,
                is_inactive: days >= inactive_after_days,
                days_since_last_activity: Some(days),
            }
        }
    }
}

#[async_trait]
impl InactivityOracle for RpcInactivityOracle {
    async fn check_inactivity(
        &self,
        wallet_address: &str,
        token_address: &str,
        context: &AnalysisContext,
    ) -> Result<InactivityReport, AnalysisError> {
        let label = context.label();
        let accounts = self
            .client
            .get_token_accounts_by_owner(&label, wallet_address, token_address)
            .await?;

        let activity = if accounts.is_empty() {
            AccountActivity::NoAccount
        } else {
            let mut any_signature = false;
            let mut newest: Option<i64> = None;

            for account in &accounts {
                let signatures = self
                    .client
                    .get_signatures_for_address(&label, &account.address, 1, None)
                    .await?;

                if let Some(latest) = signatures.first() {
                    any_signature = true;
                    if let Some(time) = latest.block_time {
                        newest = Some(newest.map_or(time, |n| n.max(time)));
                    }
                }
            }

            if any_signature {
                AccountActivity::LastSeen(newest)
            } else {
                AccountActivity::NoTransactions
            }
        };

        Ok(build_report(activity, Utc::now(), self.inactive_after_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_account_means_no_token() {
        let report = build_report(AccountActivity::NoAccount, now(), 30);
        assert_eq!(report.category, Some(InactivityCategory::NoToken));
        assert!(!report.is_inactive);
    }

    #[test]
    fn test_untouched_account() {
        let report = build_report(AccountActivity::NoTransactions, now(), 30);
        assert_eq!(report.category, Some(InactivityCategory::NoAtaTransaction));
    }

    #[test]
    fn test_idle_holding_is_inactive() {
        let forty_days_ago = now().timestamp() - 40 * 86_400;
        let report = build_report(AccountActivity::LastSeen(Some(forty_days_ago)), now(), 30);
        assert_eq!(report.category, None);
        assert!(report.is_inactive);
        assert_eq!(report.days_since_last_activity, Some(40));
    }

    #[test]
    fn test_recent_activity_is_not_inactive() {
        let yesterday = now().timestamp() - 86_400;
        let report = build_report(AccountActivity::LastSeen(Some(yesterday)), now(), 30);
        assert!(!report.is_inactive);
        assert_eq!(report.days_since_last_activity, Some(1));

        let unknown_time = build_report(AccountActivity::LastSeen(None), now(), 30);
        assert_eq!(unknown_time, InactivityReport::default());
    }

    #[test]
    fn test_days_since_future_block_time() {
        assert_eq!(days_since(now(), now().timestamp() + 500), 0);
    }
}
