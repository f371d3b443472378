/// Log tags identify the subsystem a message comes from
///
/// Each tag maps to a `--debug-<key>` command-line flag that unlocks its
/// debug-level output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    RateLimit,
    Sources,
    Filter,
    Classifier,
    Scheduler,
    Aggregator,
    Analyzer,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used in `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Rpc => "rpc".to_string(),
            LogTag::RateLimit => "rate-limit".to_string(),
            LogTag::Sources => "sources".to_string(),
            LogTag::Filter => "filter".to_string(),
            LogTag::Classifier => "classifier".to_string(),
            LogTag::Scheduler => "scheduler".to_string(),
            LogTag::Aggregator => "aggregator".to_string(),
            LogTag::Analyzer => "analyzer".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(name) => name.to_lowercase(),
        }
    }

    /// Uppercase label used in log lines (console and file)
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Rpc => "RPC".to_string(),
            LogTag::RateLimit => "RATELIMIT".to_string(),
            LogTag::Sources => "SOURCES".to_string(),
            LogTag::Filter => "FILTER".to_string(),
            LogTag::Classifier => "CLASSIFY".to_string(),
            LogTag::Scheduler => "SCHEDULER".to_string(),
            LogTag::Aggregator => "AGGREGATE".to_string(),
            LogTag::Analyzer => "ANALYZER".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }

    /// All built-in tags (used for help output)
    pub fn all() -> Vec<LogTag> {
        vec![
            LogTag::System,
            LogTag::Config,
            LogTag::Rpc,
            LogTag::RateLimit,
            LogTag::Sources,
            LogTag::Filter,
            LogTag::Classifier,
            LogTag::Scheduler,
            LogTag::Aggregator,
            LogTag::Analyzer,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
