//! Data model of a team-supply analysis run

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token metadata, fetched once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Raw base units
    pub total_supply: u64,
}

impl TokenInfo {
    pub fn total_supply_decimal(&self) -> Decimal {
        Decimal::from(self.total_supply)
    }
}

/// A wallet holding the token, balance in raw base units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    pub balance: Decimal,
}

impl Holder {
    pub fn new(address: impl Into<String>, balance: impl Into<Decimal>) -> Self {
        Self {
            address: address.into(),
            balance: balance.into(),
        }
    }
}

/// Outcome of classifying one wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletCategory {
    Normal,
    Fresh,
    Inactive,
    #[serde(rename = "No Token")]
    NoToken,
    #[serde(rename = "No ATA Transaction")]
    NoAtaTransaction,
    Error,
}

impl WalletCategory {
    pub const ALL: [WalletCategory; 6] = [
        WalletCategory::Normal,
        WalletCategory::Fresh,
        WalletCategory::Inactive,
        WalletCategory::NoToken,
        WalletCategory::NoAtaTransaction,
        WalletCategory::Error,
    ];

    /// Categories counted as team-controlled supply
    pub fn is_team(&self) -> bool {
        match self {
            WalletCategory::Fresh
            | WalletCategory::Inactive
            | WalletCategory::NoToken
            | WalletCategory::NoAtaTransaction => true,
            WalletCategory::Normal | WalletCategory::Error => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletCategory::Normal => "Normal",
            WalletCategory::Fresh => "Fresh",
            WalletCategory::Inactive => "Inactive",
            WalletCategory::NoToken => "No Token",
            WalletCategory::NoAtaTransaction => "No ATA Transaction",
            WalletCategory::Error => "Error",
        }
    }
}

impl std::fmt::Display for WalletCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_team_category(category: WalletCategory) -> bool {
    category.is_team()
}

/// Where a wallet's first SOL came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingDetails {
    pub signature: String,
    pub amount_sol: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A holder plus its classification. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedWallet {
    pub address: String,
    pub balance: Decimal,
    pub category: WalletCategory,
    pub days_since_last_activity: Option<u32>,
    pub funder_address: Option<String>,
    pub funding_details: Option<FundingDetails>,
    pub error: Option<String>,
}

impl ClassifiedWallet {
    pub fn new(holder: &Holder, category: WalletCategory) -> Self {
        Self {
            address: holder.address.clone(),
            balance: holder.balance,
            category,
            days_since_last_activity: None,
            funder_address: None,
            funding_details: None,
            error: None,
        }
    }

    /// Wallet whose analysis failed or timed out
    pub fn failed(holder: &Holder, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(holder, WalletCategory::Error)
        }
    }

    pub fn is_team(&self) -> bool {
        self.category.is_team()
    }
}

/// Team wallet as exposed in the scan view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWallet {
    pub address: String,
    pub balance: String,
    pub percentage: f64,
    pub category: WalletCategory,
    pub funder_address: Option<String>,
    pub funding_details: Option<FundingDetails>,
}

/// Full-detail view of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
    pub token_info: TokenInfo,
    pub analyzed_wallets: Vec<ClassifiedWallet>,
    pub team_wallets: Vec<TeamWallet>,
    pub total_supply_controlled: Decimal,
    pub token_address: String,
}

/// Team wallet as persisted for long-term tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedWallet {
    pub address: String,
    pub category: WalletCategory,
    pub balance: Decimal,
    pub funder_address: Option<String>,
}

/// Tracking-oriented view of the same classification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub decimals: u8,
    pub total_supply: String,
    pub team_supply_held: Decimal,
    pub total_supply_controlled: Decimal,
    pub analyzed_wallet_count: usize,
    pub tracked_wallets: Vec<TrackedWallet>,
    pub analyzed_at: DateTime<Utc>,
}

/// One `{step, timestamp}` entry of a run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    pub step: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub operation_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub steps: Vec<RunStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub scan_data: ScanData,
    pub tracking_info: TrackingInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSummary>,
}

/// Caller-supplied labels that travel with every request of a run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisContext {
    pub main_context: String,
    pub sub_context: String,
    pub operation_id: Option<String>,
}

impl AnalysisContext {
    pub fn new(main_context: impl Into<String>, sub_context: impl Into<String>) -> Self {
        Self {
            main_context: main_context.into(),
            sub_context: sub_context.into(),
            operation_id: None,
        }
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Label used for gate accounting, e.g. `teamSupply/classify`
    pub fn label(&self) -> String {
        match (self.main_context.is_empty(), self.sub_context.is_empty()) {
            (true, true) => "default".to_string(),
            (false, true) => self.main_context.clone(),
            (true, false) => self.sub_context.clone(),
            (false, false) => format!("{}/{}", self.main_context, self.sub_context),
        }
    }
}
