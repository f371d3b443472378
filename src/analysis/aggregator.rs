//! Reduces classified wallets into team supply figures
//!
//! All supply math stays in raw base units and `Decimal`; floats only appear
//! in the per-wallet display percentage.

use super::types::{
    AnalysisResult, ClassifiedWallet, ScanData, TeamWallet, TokenInfo, TrackedWallet, TrackingInfo,
};
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `100 × amount / total_supply`
pub fn percentage_of_supply(amount: Decimal, total_supply: Decimal) -> Result<Decimal, AnalysisError> {
    let overflow = || AnalysisError::Config(format!("supply percentage overflow for {}", amount));

    if total_supply <= Decimal::ZERO {
        return Err(AnalysisError::Config(
            "total supply must be positive".to_string(),
        ));
    }

    amount
        .checked_mul(ONE_HUNDRED)
        .ok_or_else(overflow)?
        .checked_div(total_supply)
        .map(|p| p.normalize())
        .ok_or_else(overflow)
}

/// Sum of team-category balances
pub fn team_supply_held(wallets: &[ClassifiedWallet]) -> Result<Decimal, AnalysisError> {
    wallets
        .iter()
        .filter(|w| w.is_team())
        .try_fold(Decimal::ZERO, |sum, w| {
            sum.checked_add(w.balance)
                .ok_or_else(|| AnalysisError::Config("team balance overflow".to_string()))
        })
}

pub fn aggregate(
    token_info: &TokenInfo,
    analyzed_wallets: Vec<ClassifiedWallet>,
) -> Result<AnalysisResult, AnalysisError> {
    if token_info.total_supply == 0 {
        return Err(AnalysisError::InvalidTokenSupply {
            address: token_info.address.clone(),
        });
    }
    let total_supply = token_info.total_supply_decimal();

    let held = team_supply_held(&analyzed_wallets)?;
    let total_supply_controlled = percentage_of_supply(held, total_supply)?;

    let mut team_wallets = Vec::new();
    let mut tracked_wallets = Vec::new();
    for wallet in analyzed_wallets.iter().filter(|w| w.is_team()) {
        let percentage = percentage_of_supply(wallet.balance, total_supply)?;
        team_wallets.push(TeamWallet {
            address: wallet.address.clone(),
            balance: wallet.balance.normalize().to_string(),
            percentage: percentage.to_f64().unwrap_or_default(),
            category: wallet.category,
            funder_address: wallet.funder_address.clone(),
            funding_details: wallet.funding_details.clone(),
        });
        tracked_wallets.push(TrackedWallet {
            address: wallet.address.clone(),
            category: wallet.category,
            balance: wallet.balance,
            funder_address: wallet.funder_address.clone(),
        });
    }

    let errors = analyzed_wallets
        .iter()
        .filter(|w| w.error.is_some())
        .count();
    logger::info(
        LogTag::Aggregator,
        &format!(
            "{}: {} team wallets of {} analyzed ({} errors), {}% of supply controlled",
            token_info.symbol,
            team_wallets.len(),
            analyzed_wallets.len(),
            errors,
            total_supply_controlled
        ),
    );

    let tracking_info = TrackingInfo {
        token_address: token_info.address.clone(),
        token_symbol: token_info.symbol.clone(),
        token_name: token_info.name.clone(),
        decimals: token_info.decimals,
        total_supply: token_info.total_supply.to_string(),
        team_supply_held: held,
        total_supply_controlled,
        analyzed_wallet_count: analyzed_wallets.len(),
        tracked_wallets,
        analyzed_at: Utc::now(),
    };

    let scan_data = ScanData {
        token_info: token_info.clone(),
        token_address: token_info.address.clone(),
        analyzed_wallets,
        team_wallets,
        total_supply_controlled,
    };

    Ok(AnalysisResult {
        scan_data,
        tracking_info,
        run: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{Holder, WalletCategory};
    use rust_decimal_macros::dec;

    fn token(total_supply: u64) -> TokenInfo {
        TokenInfo {
            address: "Mint".to_string(),
            symbol: "TEST".to_string(),
            name: "Test Token".to_string(),
            decimals: 6,
            total_supply,
        }
    }

    fn wallet(address: &str, balance: u64, category: WalletCategory) -> ClassifiedWallet {
        ClassifiedWallet::new(&Holder::new(address, balance), category)
    }

    #[test]
    fn test_thirds_sum_to_exactly_one_hundred() {
        let wallets = vec![
            wallet("A", 1, WalletCategory::Fresh),
            wallet("B", 1, WalletCategory::Fresh),
            wallet("C", 1, WalletCategory::Fresh),
        ];

        let result = aggregate(&token(3), wallets).unwrap();
        assert_eq!(result.scan_data.total_supply_controlled, dec!(100));
        assert_eq!(result.scan_data.total_supply_controlled.to_string(), "100");
        assert_eq!(result.tracking_info.team_supply_held, dec!(3));
    }

    #[test]
    fn test_only_team_categories_count() {
        let mut failed = wallet("E", 400_000, WalletCategory::Error);
        failed.error = Some("Timeout: wallet analysis exceeded 30000ms".to_string());
        let mut inactive = wallet("I", 20_000, WalletCategory::Inactive);
        inactive.days_since_last_activity = Some(40);
        inactive.funder_address = Some("Funder".to_string());

        let wallets = vec![
            wallet("N", 300_000, WalletCategory::Normal),
            failed,
            inactive,
            wallet("T", 5_000, WalletCategory::NoToken),
            wallet("X", 2_500, WalletCategory::NoAtaTransaction),
        ];

        let result = aggregate(&token(1_000_000), wallets).unwrap();
        let scan = &result.scan_data;

        assert_eq!(scan.analyzed_wallets.len(), 5);
        assert_eq!(scan.total_supply_controlled, dec!(2.75));

        let team: Vec<&str> = scan.team_wallets.iter().map(|w| w.address.as_str()).collect();
        assert_eq!(team, vec!["I", "T", "X"]);
        assert_eq!(scan.team_wallets[0].balance, "20000");
        assert_eq!(scan.team_wallets[0].percentage, 2.0);
        assert_eq!(scan.team_wallets[0].funder_address.as_deref(), Some("Funder"));
        assert_eq!(scan.team_wallets[2].percentage, 0.25);
    }

    #[test]
    fn test_views_agree() {
        let wallets = vec![
            wallet("A", 10_000, WalletCategory::Fresh),
            wallet("B", 90_000, WalletCategory::Normal),
        ];

        let result = aggregate(&token(1_000_000), wallets).unwrap();
        let tracking = &result.tracking_info;

        assert_eq!(tracking.analyzed_wallet_count, result.scan_data.analyzed_wallets.len());
        assert_eq!(tracking.total_supply_controlled, result.scan_data.total_supply_controlled);
        assert_eq!(tracking.tracked_wallets.len(), result.scan_data.team_wallets.len());
        assert_eq!(tracking.tracked_wallets[0].address, "A");
        assert_eq!(tracking.total_supply, "1000000");
        assert_eq!(tracking.token_symbol, "TEST");
        assert_eq!(result.scan_data.token_address, "Mint");
    }

    #[test]
    fn test_no_team_wallets() {
        let result = aggregate(&token(1_000), vec![wallet("A", 500, WalletCategory::Normal)]).unwrap();
        assert_eq!(result.scan_data.total_supply_controlled, Decimal::ZERO);
        assert!(result.scan_data.team_wallets.is_empty());
    }

    #[test]
    fn test_zero_supply_rejected() {
        let err = aggregate(&token(0), Vec::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidTokenSupply { .. }));
    }

    #[test]
    fn test_percentage_is_exact() {
        assert_eq!(percentage_of_supply(dec!(1), dec!(8)).unwrap(), dec!(12.5));
        assert!(percentage_of_supply(dec!(1), Decimal::ZERO).is_err());
    }
}
