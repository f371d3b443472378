//! Bounded-concurrency driver for wallet classification
//!
//! Holders are processed in fixed-size batches. Batches run strictly one
//! after another; inside a batch every wallet is classified concurrently and
//! raced against the per-wallet timeout. Progress is counted as each wallet
//! finishes, not per batch. A wallet that times out, fails or
//! panics becomes an `Error` wallet and never takes its batch down with it.
//! Cancellation is polled before every batch and aborts the whole run.

use super::types::{ClassifiedWallet, Holder};
use crate::cancellation::CancellationToken;
use crate::config::AnalysisConfig;
use crate::errors::AnalysisError;
use crate::logger::{self, LogTag};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub batch_size: usize,
    pub wallet_timeout: Duration,
    pub batch_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for SchedulerSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            wallet_timeout: Duration::from_millis(config.wallet_timeout_ms),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

/// Progress notification, emitted roughly every 10% of the holders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            100
        } else {
            ((self.processed * 100) / self.total) as u32
        }
    }
}

pub struct BatchScheduler {
    settings: SchedulerSettings,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl BatchScheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self { settings }
    }

    /// Classify every holder; `result[i]` always belongs to `holders[i]`.
    ///
    /// Returns `Err` only on cancellation, in which case nothing computed so
    /// far is handed back.
    pub async fn run_all<F, Fut, P>(
        &self,
        holders: &[Holder],
        classify: F,
        cancel: &CancellationToken,
        mut on_progress: P,
    ) -> Result<Vec<ClassifiedWallet>, AnalysisError>
    where
        F: Fn(Holder) -> Fut,
        Fut: Future<Output = Result<ClassifiedWallet, AnalysisError>>,
        P: FnMut(BatchProgress),
    {
        let total = holders.len();
        let batch_size = self.settings.batch_size.max(1);
        let batch_count = total.div_ceil(batch_size);
        let report_every = (total / 10).max(1);
        let mut next_report = report_every;
        let mut processed = 0;
        let mut results = Vec::with_capacity(total);

        for (index, batch) in holders.chunks(batch_size).enumerate() {
            cancel.check(&format!("before batch {}/{}", index + 1, batch_count))?;

            logger::debug(
                LogTag::Scheduler,
                &format!(
                    "Batch {}/{}: {} wallets",
                    index + 1,
                    batch_count,
                    batch.len()
                ),
            );

            let mut pending: FuturesUnordered<_> = batch
                .iter()
                .enumerate()
                .map(|(slot, holder)| {
                    self.classify_one(holder, &classify)
                        .map(move |outcome| (slot, outcome))
                })
                .collect();

            let mut slots: Vec<Option<ClassifiedWallet>> = (0..batch.len()).map(|_| None).collect();
            while let Some((slot, outcome)) = pending.next().await {
                slots[slot] = Some(outcome?);
                processed += 1;

                if processed >= next_report || processed == total {
                    on_progress(BatchProgress { processed, total });
                    next_report = (processed / report_every + 1) * report_every;
                }
            }

            results.extend(slots.into_iter().flatten());

            if index + 1 < batch_count && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        Ok(results)
    }

    async fn classify_one<F, Fut>(
        &self,
        holder: &Holder,
        classify: &F,
    ) -> Result<ClassifiedWallet, AnalysisError>
    where
        F: Fn(Holder) -> Fut,
        Fut: Future<Output = Result<ClassifiedWallet, AnalysisError>>,
    {
        let limit = self.settings.wallet_timeout;
        let guarded = AssertUnwindSafe(classify(holder.clone())).catch_unwind();

        match timeout(limit, guarded).await {
            Ok(Ok(Ok(wallet))) => Ok(wallet),
            Ok(Ok(Err(e))) if e.is_cancelled() => Err(e),
            Ok(Ok(Err(e))) => {
                logger::error(
                    LogTag::Scheduler,
                    &format!("Wallet {} failed: {}", holder.address, e),
                );
                Ok(ClassifiedWallet::failed(holder, e.to_string()))
            }
            Ok(Err(payload)) => {
                let error = AnalysisError::Panicked(panic_message(payload));
                logger::error(
                    LogTag::Scheduler,
                    &format!("Wallet {}: {}", holder.address, error),
                );
                Ok(ClassifiedWallet::failed(holder, error.to_string()))
            }
            Err(_) => {
                let message = format!(
                    "Timeout: wallet analysis exceeded {}ms",
                    limit.as_millis()
                );
                logger::warning(
                    LogTag::Scheduler,
                    &format!("Wallet {}: {}", holder.address, message),
                );
                Ok(ClassifiedWallet::failed(holder, message))
            }
        }
    }
}
