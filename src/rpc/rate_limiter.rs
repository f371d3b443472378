//! Outbound request gate shared by every RPC call
//!
//! Two limits are applied before a task runs:
//! - a semaphore caps how many requests are in flight at once
//! - a pacing window enforces a minimum interval between request starts,
//!   with a burst allowance refilled every second
//!
//! The gate never inspects the task's output: success or failure is handed
//! back to the caller unchanged.

use crate::config::RateLimitConfig;
use crate::logger::{self, LogTag};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Duration, Instant};

const BURST_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct PacingState {
    next_slot: Option<Instant>,
    burst_remaining: u32,
    burst_reset_at: Instant,
}

/// Counters exposed for telemetry and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateStats {
    pub total_requests: u64,
    pub completed_requests: u64,
    pub in_flight: usize,
    pub max_in_flight: usize,
    pub paced_requests: u64,
    pub requests_by_context: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct RateLimitedGate {
    semaphore: Arc<Semaphore>,
    pacing: Mutex<PacingState>,
    min_interval: Duration,
    burst_size: u32,
    total_requests: AtomicU64,
    completed_requests: AtomicU64,
    paced_requests: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    by_context: SyncMutex<HashMap<String, u64>>,
}

impl RateLimitedGate {
    pub fn new(config: &RateLimitConfig) -> Self {
        let rate = config.requests_per_second.max(1);
        let min_interval = Duration::from_millis(1000 / rate as u64);

        logger::debug(
            LogTag::RateLimit,
            &format!(
                "Gate initialized: {} req/s ({}ms interval), burst {}, max {} in flight",
                rate,
                min_interval.as_millis(),
                config.burst_size,
                config.max_concurrent_requests
            ),
        );

        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            pacing: Mutex::new(PacingState {
                next_slot: None,
                burst_remaining: config.burst_size,
                burst_reset_at: Instant::now(),
            }),
            min_interval,
            burst_size: config.burst_size,
            total_requests: AtomicU64::new(0),
            completed_requests: AtomicU64::new(0),
            paced_requests: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            by_context: SyncMutex::new(HashMap::new()),
        }
    }

    /// Run `task` once a concurrency permit and a pacing slot are available
    pub async fn enqueue<F, T>(&self, context: &str, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        *self.by_context.lock().entry(context.to_string()).or_insert(0) += 1;

        // The semaphore is never closed, so a failed acquire only means "run unbounded".
        let _permit = self.semaphore.acquire().await.ok();
        self.wait_for_slot().await;

        let current = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(current, Ordering::AcqRel);

        let output = task.await;

        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.completed_requests.fetch_add(1, Ordering::Relaxed);
        output
    }

    /// Reserve the next start slot, sleeping outside the lock
    async fn wait_for_slot(&self) {
        let wait = {
            let mut state = self.pacing.lock().await;
            let now = Instant::now();

            if now.duration_since(state.burst_reset_at) >= BURST_WINDOW {
                state.burst_remaining = self.burst_size;
                state.burst_reset_at = now;
            }

            if state.burst_remaining > 0 {
                state.burst_remaining -= 1;
                state.next_slot = Some(now.max(state.next_slot.unwrap_or(now)));
                return;
            }

            let slot = match state.next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            state.next_slot = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            self.paced_requests.fetch_add(1, Ordering::Relaxed);
            logger::verbose(
                LogTag::RateLimit,
                &format!("Pacing request for {}ms", wait.as_millis()),
            );
            tokio::time::sleep(wait).await;
        }
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            completed_requests: self.completed_requests.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            max_in_flight: self.max_in_flight.load(Ordering::Acquire),
            paced_requests: self.paced_requests.load(Ordering::Relaxed),
            requests_by_context: self.by_context.lock().clone(),
        }
    }
}
