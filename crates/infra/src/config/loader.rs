//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `SYNCWARD_DB_PATH` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `SYNCWARD_DB_PATH`: Database file path (required for env loading)
//! - `SYNCWARD_DB_POOL_SIZE`: Connection pool size
//! - `SYNCWARD_BREAKER_FAILURE_THRESHOLD`: Failures that open the breaker
//! - `SYNCWARD_BREAKER_TIMEOUT_SECS`: Open window in seconds
//! - `SYNCWARD_DLQ_RETENTION`: Dead-letter records kept after pruning
//! - `SYNCWARD_CRITICAL_JOBS`: Comma-separated critical job classes
//! - `SYNCWARD_LOG_LEVEL`: Default log filter
//! - `SYNCWARD_LOG_FORMAT`: `json` or `pretty`
//!
//! ## File Locations
//! The loader probes the following names: `syncward.toml`, `syncward.json`,
//! `config.toml`, `config.json`; in the working directory, its parent and
//! grandparent, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use syncward_domain::{Config, LogFormat, Result, SyncwardError};

const CONFIG_FILE_NAMES: [&str; 4] = ["syncward.toml", "syncward.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the database path
/// is not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyncwardError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `SYNCWARD_DB_PATH` is required; every other variable is optional and
/// falls back to the built-in default.
///
/// # Errors
/// Returns `SyncwardError::Config` if the path is missing or a value does
/// not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("SYNCWARD_DB_PATH")?;
    if let Some(pool_size) = env_parse("SYNCWARD_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }
    if let Some(threshold) = env_parse("SYNCWARD_BREAKER_FAILURE_THRESHOLD")? {
        config.circuit_breaker.failure_threshold = threshold;
    }
    if let Some(timeout) = env_parse("SYNCWARD_BREAKER_TIMEOUT_SECS")? {
        config.circuit_breaker.timeout_secs = timeout;
    }
    if let Some(retention) = env_parse("SYNCWARD_DLQ_RETENTION")? {
        config.dead_letter.retention_limit = retention;
    }
    if let Ok(classes) = std::env::var("SYNCWARD_CRITICAL_JOBS") {
        config.dead_letter.critical_job_classes = classes
            .split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Ok(level) = std::env::var("SYNCWARD_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(format) = std::env::var("SYNCWARD_LOG_FORMAT") {
        config.logging.format = parse_log_format(&format)?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for a config file.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyncwardError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncwardError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncwardError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncwardError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by the extension of `path` (`.json` or `.toml`);
/// sections and fields that are absent keep their defaults.
///
/// # Errors
/// Returns `SyncwardError::Config` if format is unsupported or parsing
/// fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncwardError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncwardError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SyncwardError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the working directory and up to two parents, then the directory
/// holding the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut bases = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        bases.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        bases.push(exe_dir);
    }

    bases.iter().find_map(|base| probe_dir(base))
}

fn probe_dir(base: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| base.join(name)).find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SyncwardError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SyncwardError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        other => Err(SyncwardError::Config(format!("Unsupported log format: {other}"))),
    }
}
