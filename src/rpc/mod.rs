//! RPC access layer: rate-limited gate + JSON-RPC client

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::RpcClient;
pub use rate_limiter::{GateStats, RateLimitedGate};
pub use types::{ParsedTokenAccount, ParsedTransaction, SignatureInfo, SystemInstruction, TokenSupply};
