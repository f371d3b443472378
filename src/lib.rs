pub mod analysis;
pub mod arguments;
pub mod cancellation;
pub mod config;
pub mod errors;
pub mod logger;
pub mod rpc;
pub mod sources;

pub use analysis::{AnalysisResult, TeamSupplyAnalyzer};
pub use cancellation::CancellationToken;
pub use errors::AnalysisError;
