/// Logger configuration, derived from command-line flags at startup
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that is displayed (Debug/Verbose still need their flags)
    pub min_level: LogLevel,
    /// Tags with `--debug-<tag>` enabled
    pub debug_tags: HashSet<String>,
    /// Tags with `--verbose-<tag>` enabled
    pub verbose_tags: HashSet<String>,
    /// When non-empty, only these tags are shown (errors always pass)
    pub enabled_tags: HashSet<String>,
    /// Mirror every line into a dated file
    pub file_logging: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_logging: true,
            log_dir: default_log_dir(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("supplyscan").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub fn update_logger_config<F: FnOnce(&mut LoggerConfig)>(f: F) {
    f(&mut LOGGER_CONFIG.write());
}

/// Build the logger configuration from the stored command-line arguments
pub fn init_from_args() {
    let args = arguments::get_cmd_args();
    let mut config = LoggerConfig::default();

    if arguments::has_arg("--verbose") {
        config.min_level = LogLevel::Verbose;
    } else if arguments::has_arg("--quiet") {
        config.min_level = LogLevel::Warning;
    }

    for arg in &args {
        if let Some(key) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(key.to_lowercase());
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(key.to_lowercase());
        }
    }

    if let Some(tags) = arguments::get_arg_value("--log-tags") {
        config.enabled_tags = tags
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
    }

    if let Some(dir) = arguments::get_arg_value("--log-dir") {
        config.log_dir = PathBuf::from(dir);
    }

    if arguments::has_arg("--no-file-log") {
        config.file_logging = false;
    }

    set_logger_config(config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    config.min_level == LogLevel::Verbose || config.debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
