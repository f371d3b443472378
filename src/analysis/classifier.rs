//! Per-wallet classification
//!
//! Checks run cheapest-and-most-decisive first:
//!
//! 1. excessive activity (≥ 1000 signatures) → `Normal`, nothing else runs
//! 2. fewer than 100 signatures → `Fresh`
//! 3. inactivity oracle → `No Token` / `No ATA Transaction` / `Inactive` / `Normal`
//! 4. funding oracle annotates the wallet, never changes its category
//!
//! Oracle failures are turned into [`Lookup::Failed`] and fed to the pure
//! verdict functions below, so a flaky lookup can only ever fail open.
//! Cancellation is the one error that leaves `classify`.

use super::types::{AnalysisContext, ClassifiedWallet, Holder, WalletCategory};
use crate::cancellation::CancellationToken;
use crate::config::AnalysisConfig;
use crate::errors::AnalysisError;
use crate::logger::{self, LogLevel, LogTag};
use crate::sources::{
    validate_address, ActivityOracle, FundingInfo, FundingOracle, InactivityCategory,
    InactivityOracle, InactivityReport, WalletRef,
};
use std::sync::Arc;

/// Outcome of one oracle lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Ok(T),
    Failed(String),
}

impl<T> Lookup<T> {
    /// Absorbs every error except cancellation
    pub fn capture(result: Result<T, AnalysisError>) -> Result<Lookup<T>, AnalysisError> {
        match result {
            Ok(value) => Ok(Lookup::Ok(value)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => Ok(Lookup::Failed(e.to_string())),
        }
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Lookup::Ok(value) => Some(value),
            Lookup::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub excessive_activity_threshold: usize,
    pub fresh_wallet_threshold: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for ClassifierSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            excessive_activity_threshold: config.excessive_activity_threshold,
            fresh_wallet_threshold: config.fresh_wallet_threshold,
        }
    }
}

/// A failed count is never excessive
pub fn is_excessive(count: &Lookup<usize>, threshold: usize) -> bool {
    matches!(count, Lookup::Ok(n) if *n >= threshold)
}

/// A failed count is never fresh
pub fn is_fresh(count: &Lookup<usize>, threshold: usize) -> bool {
    matches!(count, Lookup::Ok(n) if *n < threshold)
}

/// Category (and inactivity age) implied by the inactivity oracle
pub fn inactivity_verdict(report: &Lookup<InactivityReport>) -> (WalletCategory, Option<u32>) {
    let report = match report {
        Lookup::Ok(report) => report,
        Lookup::Failed(_) => return (WalletCategory::Normal, None),
    };

    match report.category {
        Some(InactivityCategory::NoToken) => (WalletCategory::NoToken, None),
        Some(InactivityCategory::NoAtaTransaction) => (WalletCategory::NoAtaTransaction, None),
        None if report.is_inactive => (WalletCategory::Inactive, report.days_since_last_activity),
        None => (WalletCategory::Normal, None),
    }
}

/// Log level for a failed inactivity lookup. The oracle reports "No Token"
/// through its result, so an error carrying it is noise.
pub fn inactivity_failure_level(message: &str) -> LogLevel {
    if message.contains("No Token") {
        LogLevel::Debug
    } else {
        LogLevel::Warning
    }
}

pub struct WalletClassifier {
    activity: Arc<dyn ActivityOracle>,
    inactivity: Arc<dyn InactivityOracle>,
    funding: Arc<dyn FundingOracle>,
    settings: ClassifierSettings,
}

impl WalletClassifier {
    pub fn new(
        activity: Arc<dyn ActivityOracle>,
        inactivity: Arc<dyn InactivityOracle>,
        funding: Arc<dyn FundingOracle>,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            activity,
            inactivity,
            funding,
            settings,
        }
    }

    /// Classify one holder. Only cancellation is returned as `Err`; any other
    /// failure becomes a wallet with category `Error`.
    pub async fn classify(
        &self,
        holder: &Holder,
        token_address: &str,
        context: &AnalysisContext,
        cancel: &CancellationToken,
    ) -> Result<ClassifiedWallet, AnalysisError> {
        cancel.check("before wallet classification")?;

        match self.run_checks(holder, token_address, context, cancel).await {
            Ok(wallet) => Ok(wallet),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                logger::error(
                    LogTag::Classifier,
                    &format!("Classification of {} failed: {}", holder.address, e),
                );
                Ok(ClassifiedWallet::failed(holder, e.to_string()))
            }
        }
    }

    async fn run_checks(
        &self,
        holder: &Holder,
        token_address: &str,
        context: &AnalysisContext,
        cancel: &CancellationToken,
    ) -> Result<ClassifiedWallet, AnalysisError> {
        let address = holder.address.as_str();
        validate_address(address)?;

        cancel.check("before activity check")?;
        let excessive_cap = self.settings.excessive_activity_threshold + 1;
        let activity = self.signature_count(address, excessive_cap, context).await?;
        if is_excessive(&activity, self.settings.excessive_activity_threshold) {
            logger::debug(
                LogTag::Classifier,
                &format!("{} has excessive activity, classified Normal", address),
            );
            return Ok(ClassifiedWallet::new(holder, WalletCategory::Normal));
        }

        cancel.check("before freshness check")?;
        let fresh_cap = self.settings.fresh_wallet_threshold + 1;
        let count = self.signature_count(address, fresh_cap, context).await?;

        let mut wallet = if is_fresh(&count, self.settings.fresh_wallet_threshold) {
            ClassifiedWallet::new(holder, WalletCategory::Fresh)
        } else {
            cancel.check("before inactivity check")?;
            let report = Lookup::capture(
                self.inactivity
                    .check_inactivity(address, token_address, context)
                    .await,
            )?;

            if let Lookup::Failed(message) = &report {
                let text = format!("Inactivity check failed for {}: {}", address, message);
                match inactivity_failure_level(message) {
                    LogLevel::Debug => logger::debug(LogTag::Classifier, &text),
                    _ => logger::warning(LogTag::Classifier, &text),
                }
            }

            let (category, days) = inactivity_verdict(&report);
            ClassifiedWallet {
                days_since_last_activity: days,
                ..ClassifiedWallet::new(holder, category)
            }
        };

        cancel.check("before funding check")?;
        let wallets = [WalletRef {
            address: address.to_string(),
        }];
        match Lookup::capture(self.funding.analyze_funding(&wallets, context).await)? {
            Lookup::Ok(results) => {
                let FundingInfo {
                    funder_address,
                    funding_details,
                } = results.into_iter().next().unwrap_or_default();
                wallet.funder_address = funder_address;
                wallet.funding_details = funding_details;
            }
            Lookup::Failed(message) => {
                logger::warning(
                    LogTag::Classifier,
                    &format!("Funding analysis failed for {}: {}", address, message),
                );
            }
        }

        logger::debug(
            LogTag::Classifier,
            &format!("{} → {}", address, wallet.category),
        );
        Ok(wallet)
    }

    async fn signature_count(
        &self,
        address: &str,
        limit: usize,
        context: &AnalysisContext,
    ) -> Result<Lookup<usize>, AnalysisError> {
        let count = Lookup::capture(
            self.activity
                .get_signature_count(address, limit, context)
                .await,
        )?;
        if let Lookup::Failed(message) = &count {
            logger::debug(
                LogTag::Classifier,
                &format!("Signature count (limit {}) failed for {}: {}", limit, address, message),
            );
        }
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory oracles shared by the analysis tests

    use super::*;
    use crate::analysis::types::FundingDetails;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeActivity {
        pub counts: HashMap<String, usize>,
        pub failing: bool,
        pub calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakeActivity {
        pub fn with_counts(counts: &[(&str, usize)]) -> Self {
            Self {
                counts: counts.iter().map(|(a, c)| (a.to_string(), *c)).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ActivityOracle for FakeActivity {
        async fn get_signature_count(
            &self,
            address: &str,
            limit: usize,
            _context: &AnalysisContext,
        ) -> Result<usize, AnalysisError> {
            self.calls.lock().push((address.to_string(), limit));
            if self.failing {
                return Err(AnalysisError::from_source("activity", "rpc down"));
            }
            Ok(self.counts.get(address).copied().unwrap_or(0).min(limit))
        }
    }

    pub enum InactivityBehavior {
        Report(InactivityReport),
        Fail(String),
    }

    pub struct FakeInactivity {
        pub behavior: InactivityBehavior,
        pub calls: Mutex<usize>,
    }

    impl FakeInactivity {
        pub fn report(report: InactivityReport) -> Self {
            Self {
                behavior: InactivityBehavior::Report(report),
                calls: Mutex::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                behavior: InactivityBehavior::Fail(message.to_string()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl InactivityOracle for FakeInactivity {
        async fn check_inactivity(
            &self,
            _wallet_address: &str,
            _token_address: &str,
            _context: &AnalysisContext,
        ) -> Result<InactivityReport, AnalysisError> {
            *self.calls.lock() += 1;
            match &self.behavior {
                InactivityBehavior::Report(report) => Ok(report.clone()),
                InactivityBehavior::Fail(message) => {
                    Err(AnalysisError::from_source("inactivity", message.clone()))
                }
            }
        }
    }

    #[derive(Default)]
    pub struct FakeFunding {
        pub funder: Option<String>,
        pub failing: bool,
        pub calls: Mutex<usize>,
    }

    impl FakeFunding {
        pub fn funded_by(funder: &str) -> Self {
            Self {
                funder: Some(funder.to_string()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl FundingOracle for FakeFunding {
        async fn analyze_funding(
            &self,
            wallets: &[WalletRef],
            _context: &AnalysisContext,
        ) -> Result<Vec<FundingInfo>, AnalysisError> {
            *self.calls.lock() += 1;
            if self.failing {
                return Err(AnalysisError::from_source("funding", "transaction not found"));
            }
            Ok(wallets
                .iter()
                .map(|_| FundingInfo {
                    funder_address: self.funder.clone(),
                    funding_details: self.funder.as_ref().map(|_| FundingDetails {
                        signature: "fundingSig".to_string(),
                        amount_sol: 1.5,
                        timestamp: None,
                    }),
                })
                .collect())
        }
    }
}
