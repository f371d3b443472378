//! Run bookkeeping: timestamped step log plus pluggable progress sinks

use super::types::{RunStep, RunSummary};
use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::Instant;

/// Receives `{step, timestamp}` notifications in order. Purely observational.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, operation_id: &str, step: &RunStep);
}

/// Forwards steps to the logger
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn notify(&self, operation_id: &str, step: &RunStep) {
        let short_id: String = operation_id.chars().take(8).collect();
        logger::info(LogTag::Analyzer, &format!("[{}] {}", short_id, step.step));
    }
}

/// Keeps every step in memory
#[derive(Default)]
pub struct MemoryProgressSink {
    steps: Mutex<Vec<RunStep>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<RunStep> {
        self.steps.lock().clone()
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.lock().iter().map(|s| s.step.clone()).collect()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn notify(&self, _operation_id: &str, step: &RunStep) {
        self.steps.lock().push(step.clone());
    }
}

pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn notify(&self, _operation_id: &str, _step: &RunStep) {}
}

/// State of one analyzer invocation, dropped when it returns
pub struct AnalysisRun<'a> {
    operation_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    steps: Mutex<Vec<RunStep>>,
    sink: &'a dyn ProgressSink,
}

impl<'a> AnalysisRun<'a> {
    pub fn new(operation_id: impl Into<String>, sink: &'a dyn ProgressSink) -> Self {
        Self {
            operation_id: operation_id.into(),
            started_at: Utc::now(),
            started: Instant::now(),
            steps: Mutex::new(Vec::new()),
            sink,
        }
    }

    pub fn record(&self, step: impl Into<String>) {
        let entry = RunStep {
            step: step.into(),
            timestamp: Utc::now(),
        };
        self.sink.notify(&self.operation_id, &entry);
        self.steps.lock().push(entry);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            operation_id: self.operation_id.clone(),
            started_at: self.started_at,
            duration_ms: self.started.elapsed().as_millis() as u64,
            steps: self.steps.lock().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_records_in_order() {
        let sink = MemoryProgressSink::new();
        let run = AnalysisRun::new("op-1", &sink);
        run.record("started");
        run.record("token_info_fetched");

        let summary = run.summary();
        assert_eq!(summary.operation_id, "op-1");
        assert_eq!(summary.steps.len(), 2);
        assert!(summary.steps[0].timestamp <= summary.steps[1].timestamp);
        assert_eq!(sink.step_names(), vec!["started", "token_info_fetched"]);
        assert_eq!(sink.steps(), summary.steps);
    }

    #[test]
    fn test_null_sink_still_keeps_run_log() {
        let run = AnalysisRun::new("op-2", &NullProgressSink);
        run.record("started");
        assert_eq!(run.summary().steps.len(), 1);
    }
}
