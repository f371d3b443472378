//! Team supply analysis entry point
//!
//! token info → holders → significant holders → batched classification →
//! aggregation. Cancellation is polled between every stage and propagated
//! unchanged; no partial result ever leaves this module.

use super::aggregator::aggregate;
use super::classifier::{ClassifierSettings, WalletClassifier};
use super::filter::filter_significant_holders;
use super::progress::{AnalysisRun, LogProgressSink, ProgressSink};
use super::scheduler::{BatchScheduler, SchedulerSettings};
use super::types::{AnalysisContext, AnalysisResult, Holder};
use crate::cancellation::CancellationToken;
use crate::config::Config;
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use crate::rpc::RpcClient;
use crate::sources::{
    validate_address, HolderListSource, RpcActivityOracle, RpcFundingOracle, RpcHolderListSource,
    RpcInactivityOracle, RpcTokenInfoSource, TokenInfoSource,
};
use std::sync::Arc;

pub struct TeamSupplyAnalyzer {
    token_info: Arc<dyn TokenInfoSource>,
    holders: Arc<dyn HolderListSource>,
    classifier: WalletClassifier,
    scheduler: BatchScheduler,
    sink: Arc<dyn ProgressSink>,
}

impl TeamSupplyAnalyzer {
    pub fn new(
        token_info: Arc<dyn TokenInfoSource>,
        holders: Arc<dyn HolderListSource>,
        classifier: WalletClassifier,
        scheduler: BatchScheduler,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            token_info,
            holders,
            classifier,
            scheduler,
            sink,
        }
    }

    /// Wires every collaborator to one shared, rate-limited RPC client
    pub fn from_rpc(client: Arc<RpcClient>, config: &Config) -> Self {
        let classifier = WalletClassifier::new(
            Arc::new(RpcActivityOracle::new(client.clone())),
            Arc::new(RpcInactivityOracle::new(
                client.clone(),
                config.inactivity.inactive_after_days,
            )),
            Arc::new(RpcFundingOracle::new(
                client.clone(),
                config.funding.max_signature_pages,
                config.funding.min_funding_lamports,
            )),
            ClassifierSettings::from(&config.analysis),
        );

        Self::new(
            Arc::new(RpcTokenInfoSource::new(client.clone(), &config.metadata)),
            Arc::new(RpcHolderListSource::new(client)),
            classifier,
            BatchScheduler::new(SchedulerSettings::from(&config.analysis)),
            Arc::new(LogProgressSink),
        )
    }

    pub async fn analyze_team_supply(
        &self,
        token_address: &str,
        context: &AnalysisContext,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        let operation_id = context
            .operation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let context = context.clone().with_operation_id(operation_id.clone());
        let run = AnalysisRun::new(operation_id, self.sink.as_ref());

        let outcome = self.run_pipeline(token_address, &context, cancel, &run).await;

        match outcome {
            Ok(mut result) => {
                result.run = Some(run.summary());
                Ok(result)
            }
            Err(e) if e.is_cancelled() => {
                logger::warning(
                    LogTag::Analyzer,
                    &format!("Analysis of {} cancelled: {}", token_address, e),
                );
                Err(e)
            }
            Err(e) => {
                logger::error(
                    LogTag::Analyzer,
                    &format!("Analysis of {} failed: {}", token_address, e),
                );
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        token_address: &str,
        context: &AnalysisContext,
        cancel: &CancellationToken,
        run: &AnalysisRun<'_>,
    ) -> Result<AnalysisResult, AnalysisError> {
        run.record("started");
        cancel.check("at start")?;
        validate_address(token_address)?;

        let token_info = self.token_info.get_token_info(token_address, context).await?;
        run.record("token_info_fetched");
        cancel.check("after token info fetch")?;

        if token_info.total_supply == 0 {
            return Err(AnalysisError::InvalidTokenSupply {
                address: token_address.to_string(),
            });
        }

        let holders = self.holders.get_holders(token_address, context).await?;
        run.record("holders_fetched");
        cancel.check("after holder fetch")?;

        let significant = filter_significant_holders(&holders, token_info.total_supply);
        run.record("holders_filtered");
        cancel.check("after filtering")?;

        logger::info(
            LogTag::Analyzer,
            &format!(
                "{} ({}): {} holders, {} significant",
                token_info.symbol,
                token_address,
                holders.len(),
                significant.len()
            ),
        );

        let classifier = &self.classifier;
        let analyzed = self
            .scheduler
            .run_all(
                &significant,
                |holder: Holder| async move {
                    classifier
                        .classify(&holder, token_address, context, cancel)
                        .await
                },
                cancel,
                |progress| {
                    run.record(format!("progress:{}/{}", progress.processed, progress.total))
                },
            )
            .await?;
        run.record("wallets_classified");

        let result = aggregate(&token_info, analyzed)?;
        run.record("completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::fakes::{FakeActivity, FakeFunding, FakeInactivity};
    use crate::analysis::progress::MemoryProgressSink;
    use crate::analysis::types::{RunStep, TokenInfo, WalletCategory};
    use crate::sources::InactivityReport;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const RAYDIUM_AMM: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";

    fn address(seed: u8) -> String {
        bs58::encode([seed; 32]).into_string()
    }

    struct FakeTokenInfo {
        total_supply: Option<u64>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TokenInfoSource for FakeTokenInfo {
        async fn get_token_info(
            &self,
            address: &str,
            _context: &AnalysisContext,
        ) -> Result<TokenInfo, AnalysisError> {
            *self.calls.lock() += 1;
            match self.total_supply {
                Some(total_supply) => Ok(TokenInfo {
                    address: address.to_string(),
                    symbol: "TEST".to_string(),
                    name: "Test Token".to_string(),
                    decimals: 6,
                    total_supply,
                }),
                None => Err(AnalysisError::TokenNotFound {
                    address: address.to_string(),
                    reason: "mint account does not exist".to_string(),
                }),
            }
        }
    }

    struct FakeHolders {
        holders: Vec<Holder>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl HolderListSource for FakeHolders {
        async fn get_holders(
            &self,
            _address: &str,
            _context: &AnalysisContext,
        ) -> Result<Vec<Holder>, AnalysisError> {
            *self.calls.lock() += 1;
            Ok(self.holders.clone())
        }
    }

    /// Cancels the run when a given step is recorded
    struct CancelOnStep {
        step: String,
        cancel: CancellationToken,
        inner: MemoryProgressSink,
    }

    impl ProgressSink for CancelOnStep {
        fn notify(&self, operation_id: &str, step: &RunStep) {
            self.inner.notify(operation_id, step);
            if step.step == self.step {
                self.cancel.cancel();
            }
        }
    }

    struct Fixture {
        token_info: Arc<FakeTokenInfo>,
        holders: Arc<FakeHolders>,
    }

    impl Fixture {
        fn new(total_supply: Option<u64>, holders: Vec<Holder>) -> Self {
            Self {
                token_info: Arc::new(FakeTokenInfo {
                    total_supply,
                    calls: Mutex::new(0),
                }),
                holders: Arc::new(FakeHolders {
                    holders,
                    calls: Mutex::new(0),
                }),
            }
        }

        fn analyzer(&self, activity: FakeActivity, sink: Arc<dyn ProgressSink>) -> TeamSupplyAnalyzer {
            let classifier = WalletClassifier::new(
                Arc::new(activity),
                Arc::new(FakeInactivity::report(InactivityReport {
                    category: None,
                    is_inactive: true,
                    days_since_last_activity: Some(45),
                })),
                Arc::new(FakeFunding::default()),
                ClassifierSettings::default(),
            );
            let scheduler = BatchScheduler::new(SchedulerSettings {
                batch_size: 5,
                wallet_timeout: Duration::from_secs(30),
                batch_delay: Duration::ZERO,
            });

            TeamSupplyAnalyzer::new(
                self.token_info.clone(),
                self.holders.clone(),
                classifier,
                scheduler,
                sink,
            )
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let fresh = address(1);
        let busy = address(2);
        let idle = address(3);
        let dust = address(4);

        let fixture = Fixture::new(
            Some(1_000_000),
            vec![
                Holder::new(RAYDIUM_AMM, 300_000u64),
                Holder::new(busy.clone(), 100_000u64),
                Holder::new(idle.clone(), 50_000u64),
                Holder::new(fresh.clone(), 2_000u64),
                Holder::new(dust, 500u64),
            ],
        );
        let activity = FakeActivity::with_counts(&[
            (fresh.as_str(), 10),
            (busy.as_str(), 5_000),
            (idle.as_str(), 400),
        ]);
        let sink = Arc::new(MemoryProgressSink::new());
        let analyzer = fixture.analyzer(activity, sink.clone());

        let context = AnalysisContext::new("teamSupply", "cli").with_operation_id("op-42");
        let result = analyzer
            .analyze_team_supply(MINT, &context, &CancellationToken::new())
            .await
            .unwrap();

        let scan = &result.scan_data;
        let categories: Vec<(&str, WalletCategory)> = scan
            .analyzed_wallets
            .iter()
            .map(|w| (w.address.as_str(), w.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                (busy.as_str(), WalletCategory::Normal),
                (idle.as_str(), WalletCategory::Inactive),
                (fresh.as_str(), WalletCategory::Fresh),
            ]
        );
        assert_eq!(scan.analyzed_wallets[1].days_since_last_activity, Some(45));
        assert_eq!(scan.total_supply_controlled, dec!(5.2));
        assert_eq!(result.tracking_info.team_supply_held, dec!(52000));

        let run = result.run.unwrap();
        assert_eq!(run.operation_id, "op-42");
        assert_eq!(
            sink.step_names(),
            vec![
                "started",
                "token_info_fetched",
                "holders_fetched",
                "holders_filtered",
                "progress:1/3",
                "progress:2/3",
                "progress:3/3",
                "wallets_classified",
                "completed",
            ]
        );
        assert_eq!(run.steps, sink.steps());
    }

    #[tokio::test]
    async fn test_generated_operation_id() {
        let fixture = Fixture::new(Some(1_000), vec![]);
        let analyzer = fixture.analyzer(FakeActivity::default(), Arc::new(MemoryProgressSink::new()));

        let result = analyzer
            .analyze_team_supply(MINT, &AnalysisContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        let run = result.run.unwrap();
        assert!(uuid::Uuid::parse_str(&run.operation_id).is_ok());
        assert!(result.scan_data.analyzed_wallets.is_empty());
        assert_eq!(result.scan_data.total_supply_controlled, dec!(0));
    }

    #[tokio::test]
    async fn test_unknown_token_is_fatal() {
        let fixture = Fixture::new(None, vec![Holder::new(address(1), 10u64)]);
        let analyzer = fixture.analyzer(FakeActivity::default(), Arc::new(MemoryProgressSink::new()));

        let err = analyzer
            .analyze_team_supply(MINT, &AnalysisContext::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::TokenNotFound { .. }));
        assert!(!err.is_cancelled());
        assert_eq!(*fixture.holders.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_zero_supply_and_bad_address_are_fatal() {
        let fixture = Fixture::new(Some(0), vec![]);
        let analyzer = fixture.analyzer(FakeActivity::default(), Arc::new(MemoryProgressSink::new()));

        let err = analyzer
            .analyze_team_supply(MINT, &AnalysisContext::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidTokenSupply { .. }));

        let err = analyzer
            .analyze_team_supply("bogus", &AnalysisContext::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fixture = Fixture::new(Some(1_000), vec![]);
        let analyzer = fixture.analyzer(FakeActivity::default(), Arc::new(MemoryProgressSink::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = analyzer
            .analyze_team_supply(MINT, &AnalysisContext::default(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(*fixture.token_info.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_after_second_of_four_batches() {
        // 20 holders at 1% each → 4 batches of 5
        let holders: Vec<Holder> = (1..=20).map(|i| Holder::new(address(i), 10_000u64)).collect();
        let fixture = Fixture::new(Some(1_000_000), holders);

        let cancel = CancellationToken::new();
        let sink = Arc::new(CancelOnStep {
            step: "progress:10/20".to_string(),
            cancel: cancel.clone(),
            inner: MemoryProgressSink::new(),
        });
        let activity = FakeActivity::with_counts(&[]);
        let analyzer = fixture.analyzer(activity, sink.clone());

        let err = analyzer
            .analyze_team_supply(MINT, &AnalysisContext::default(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(err.to_string().contains("before batch 3/4"));

        let steps = sink.inner.step_names();
        assert!(steps.contains(&"progress:10/20".to_string()));
        assert!(!steps.contains(&"wallets_classified".to_string()));
        assert!(!steps.contains(&"completed".to_string()));
    }
}
