use super::schemas::Config;
/// Configuration utilities - loading and access helpers
///
/// - Loading configuration from disk (TOML)
/// - Thread-safe access helpers
/// - Saving the effective configuration back to disk
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

/// Global configuration instance
///
/// Single source of truth for all configuration values once loaded.
/// Access it using the helper functions below.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// If the file doesn't exist, default values from the schema definitions are used.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Parse and validate a configuration file without touching the global instance
pub fn read_config_file(path: &str) -> Result<Config, String> {
    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        eprintln!("⚠️  Config file '{}' not found, using default values", path);
        Config::default()
    };

    config
        .validate()
        .map_err(|e| format!("Invalid config file '{}': {}", path, e))?;

    Ok(config)
}

/// Execute a function with read access to the configuration
///
/// Falls back to schema defaults when `load_config()` was never called, which
/// keeps library use (and tests) free of mandatory global setup.
///
/// # Example
/// ```
/// use supplyscan::config::with_config;
///
/// let batch_size = with_config(|cfg| cfg.analysis.batch_size);
/// assert!(batch_size > 0);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration
///
/// Useful when config values are needed across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Save the current configuration to disk
pub fn save_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;

    Ok(())
}

/// Check if configuration has been initialized
pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}
