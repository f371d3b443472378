/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults
/// - Serde support
use crate::config_struct;

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// RPC endpoint configuration
    pub struct RpcConfig {
        /// JSON-RPC endpoint used for every chain lookup
        url: String = "https://api.mainnet-beta.solana.com".to_string(),

        /// Per-request timeout
        request_timeout_secs: u64 = 30,
    }
}

// ============================================================================
// RATE LIMIT CONFIGURATION
// ============================================================================

config_struct! {
    /// Outbound request gate shared by all RPC calls
    pub struct RateLimitConfig {
        /// Sustained request rate once the burst allowance is spent
        requests_per_second: u32 = 10,

        /// Requests allowed back-to-back before pacing kicks in (refilled every second)
        burst_size: u32 = 5,

        /// Upper bound on requests in flight at the same time
        max_concurrent_requests: usize = 5,
    }
}

// ============================================================================
// ANALYSIS CONFIGURATION
// ============================================================================

config_struct! {
    /// Wallet classification pipeline tuning
    pub struct AnalysisConfig {
        /// Wallets classified concurrently per batch
        batch_size: usize = 5,

        /// Hard limit for a single wallet classification
        wallet_timeout_ms: u64 = 30_000,

        /// Pause between two batches
        batch_delay_ms: u64 = 200,

        /// Signature count at which a wallet is assumed organic
        excessive_activity_threshold: usize = 1000,

        /// Wallets with fewer signatures than this are fresh
        fresh_wallet_threshold: usize = 100,
    }
}

config_struct! {
    /// Inactivity heuristic
    pub struct InactivityConfig {
        /// Token account idle for at least this many days counts as inactive
        inactive_after_days: u32 = 30,
    }
}

config_struct! {
    /// Funding source lookup
    pub struct FundingConfig {
        /// Signature pages (1000 each) walked to reach the oldest transaction
        max_signature_pages: usize = 5,

        /// Transfers below this amount are ignored when searching for the funder
        min_funding_lamports: u64 = 0,
    }
}

config_struct! {
    /// Token metadata lookup
    pub struct MetadataConfig {
        /// DexScreener token endpoint (mint is appended)
        dexscreener_url: String = "https://api.dexscreener.com/latest/dex/tokens".to_string(),

        /// Timeout for metadata lookups
        request_timeout_secs: u64 = 10,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        rate_limit: RateLimitConfig = RateLimitConfig::default(),
        analysis: AnalysisConfig = AnalysisConfig::default(),
        inactivity: InactivityConfig = InactivityConfig::default(),
        funding: FundingConfig = FundingConfig::default(),
        metadata: MetadataConfig = MetadataConfig::default(),
    }
}

impl Config {
    /// Reject values that would stall or break the pipeline
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc.url.trim().is_empty() {
            return Err("rpc.url must not be empty".to_string());
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err("rate_limit.requests_per_second must be greater than 0".to_string());
        }
        if self.rate_limit.max_concurrent_requests == 0 {
            return Err("rate_limit.max_concurrent_requests must be greater than 0".to_string());
        }
        if self.analysis.batch_size == 0 {
            return Err("analysis.batch_size must be greater than 0".to_string());
        }
        if self.analysis.wallet_timeout_ms == 0 {
            return Err("analysis.wallet_timeout_ms must be greater than 0".to_string());
        }
        if self.analysis.fresh_wallet_threshold > self.analysis.excessive_activity_threshold {
            return Err(
                "analysis.fresh_wallet_threshold must not exceed excessive_activity_threshold"
                    .to_string(),
            );
        }
        Ok(())
    }
}
