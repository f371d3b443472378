//! Team supply analysis core

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod filter;
pub mod progress;
pub mod scheduler;
pub mod types;

pub use aggregator::aggregate;
pub use analyzer::TeamSupplyAnalyzer;
pub use classifier::{ClassifierSettings, Lookup, WalletClassifier};
pub use filter::{filter_significant_holders, is_known_pool, KnownPool};
pub use progress::{AnalysisRun, LogProgressSink, MemoryProgressSink, NullProgressSink, ProgressSink};
pub use scheduler::{BatchProgress, BatchScheduler, SchedulerSettings};
pub use types::*;
