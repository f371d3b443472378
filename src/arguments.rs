/// Centralized argument handling for supplyscan
///
/// Stores the process arguments once so any module (mainly the logger) can
/// check `--debug-<module>` style flags without threading them through calls.
use crate::logger::LogTag;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}

/// Debug mode for a given log tag (`--debug-<tag>`)
pub fn is_debug_enabled(tag: &LogTag) -> bool {
    has_arg(&format!("--debug-{}", tag.to_debug_key()))
}

/// Every `--debug-*` flag currently set
pub fn get_enabled_debug_modes() -> Vec<String> {
    get_cmd_args()
        .into_iter()
        .filter(|arg| arg.starts_with("--debug-"))
        .collect()
}

/// Splits the raw arguments into the ones clap understands and the logger-only
/// flags (`--debug-*`, `--verbose-*`, `--quiet`, `--log-dir`, `--log-tags`,
/// `--no-file-log`), which are read through this module instead.
pub fn clap_args() -> Vec<String> {
    let args = get_cmd_args();
    let mut result = Vec::with_capacity(args.len());
    let mut skip_next = false;

    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--log-dir" || arg == "--log-tags" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--debug-")
            || arg.starts_with("--verbose-")
            || arg.starts_with("--log-dir=")
            || arg.starts_with("--log-tags=")
            || arg == "--quiet"
            || arg == "--no-file-log"
        {
            continue;
        }
        result.push(arg);
    }

    result
}

/// Logger flags accepted in addition to the clap-managed options
pub fn logger_flags_help() -> String {
    let tags: Vec<String> = LogTag::all()
        .iter()
        .map(|tag| format!("--debug-{}", tag.to_debug_key()))
        .collect();

    format!(
        "Logging flags:\n  {}\n  --verbose-<module>\n  --quiet\n  --log-dir <DIR>\n  --log-tags <a,b>\n  --no-file-log",
        tags.join("\n  ")
    )
}
