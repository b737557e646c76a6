//! Configuration structures
//!
//! Every section has serde defaults, so a partial file only overrides what
//! it names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_MAX_EXECUTIONS, DEFAULT_BREAKER_FAILURE_THRESHOLD, DEFAULT_BREAKER_TIMEOUT_SECS,
    DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_DEADLOCK_ATTEMPTS, DEFAULT_DEADLOCK_WAIT_SECS,
    DEFAULT_DEAD_LETTER_RETENTION, DEFAULT_ERROR_TRACKER_CAPACITY, DEFAULT_GENERIC_MAX_EXECUTIONS,
    DEFAULT_MAX_BACKOFF_SECS,
};
use crate::{Result, SyncwardError};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dead-letter database location and pool size.
    pub database: DatabaseConfig,
    /// Thresholds for the provider circuit breaker.
    pub circuit_breaker: CircuitBreakerSettings,
    /// Backoff and execution limits for failing jobs.
    pub retry: RetrySettings,
    /// Retention and alerting for permanently failed jobs.
    pub dead_letter: DeadLetterSettings,
    /// In-memory error history.
    pub error_tracker: ErrorTrackerSettings,
    /// Log output format and filter.
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that would disable a safeguard outright.
    ///
    /// # Errors
    /// Returns `SyncwardError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let checks: [(bool, &str); 7] = [
            (self.database.pool_size == 0, "database.pool_size must be greater than 0"),
            (
                self.circuit_breaker.failure_threshold == 0,
                "circuit_breaker.failure_threshold must be greater than 0",
            ),
            (
                self.circuit_breaker.timeout_secs == 0,
                "circuit_breaker.timeout_secs must be greater than 0",
            ),
            (self.retry.max_backoff_secs == 0, "retry.max_backoff_secs must be greater than 0"),
            (
                self.dead_letter.retention_limit == 0,
                "dead_letter.retention_limit must be greater than 0",
            ),
            (self.error_tracker.capacity == 0, "error_tracker.capacity must be greater than 0"),
            (self.database.path.trim().is_empty(), "database.path must not be empty"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(SyncwardError::Config((*message).to_string())),
            None => Ok(()),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: String,
    /// Maximum pooled connections. Must be greater than zero.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a half-open trial call.
    pub timeout_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_FAILURE_THRESHOLD,
            timeout_secs: DEFAULT_BREAKER_TIMEOUT_SECS,
        }
    }
}

/// Retry policy and safety-net configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Upper bound on exponential backoff.
    pub max_backoff_secs: u64,
    /// Executions allowed for network and API errors before escalation.
    pub api_max_executions: u32,
    /// Executions allowed for any other error before escalation.
    pub generic_max_executions: u32,
    /// Optional cap on rate-limit retries. `None` retries indefinitely.
    pub rate_limit_max_retries: Option<u32>,
    /// Attempts granted to deadlocked jobs.
    pub deadlock_attempts: u32,
    /// Base wait between deadlock attempts; grows linearly per attempt.
    pub deadlock_wait_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            api_max_executions: DEFAULT_API_MAX_EXECUTIONS,
            generic_max_executions: DEFAULT_GENERIC_MAX_EXECUTIONS,
            rate_limit_max_retries: None,
            deadlock_attempts: DEFAULT_DEADLOCK_ATTEMPTS,
            deadlock_wait_secs: DEFAULT_DEADLOCK_WAIT_SECS,
        }
    }
}

/// Dead-letter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadLetterSettings {
    /// Records kept after pruning.
    pub retention_limit: usize,
    /// Job classes whose permanent failure triggers an alert.
    pub critical_job_classes: BTreeSet<String>,
}

impl DeadLetterSettings {
    /// `true` when `job_class` should raise an alert.
    pub fn is_critical(&self, job_class: &str) -> bool {
        self.critical_job_classes.contains(job_class)
    }
}

impl Default for DeadLetterSettings {
    fn default() -> Self {
        Self { retention_limit: DEFAULT_DEAD_LETTER_RETENTION, critical_job_classes: BTreeSet::new() }
    }
}

/// Error tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorTrackerSettings {
    /// Records kept before the oldest are evicted.
    pub capacity: usize,
}

impl Default for ErrorTrackerSettings {
    fn default() -> Self {
        Self { capacity: DEFAULT_ERROR_TRACKER_CAPACITY }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line JSON per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Output encoding.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Json }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_control_layer_constants() {
        let config = Config::default();
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout_secs, 60);
        assert_eq!(config.retry.max_backoff_secs, 600);
        assert_eq!(config.retry.api_max_executions, 5);
        assert_eq!(config.retry.generic_max_executions, 3);
        assert_eq!(config.retry.rate_limit_max_retries, None);
        assert_eq!(config.dead_letter.retention_limit, 1000);
        assert_eq!(config.error_tracker.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[dead_letter]
critical_job_classes = ["PayrollSyncJob"]

[logging]
format = "pretty"
"#,
        )
        .expect("partial config parses");

        assert!(config.dead_letter.is_critical("PayrollSyncJob"));
        assert!(!config.dead_letter.is_critical("SyncJob"));
        assert_eq!(config.dead_letter.retention_limit, 1000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.dead_letter.retention_limit = 0;
        let err = config.validate().expect_err("zero retention rejected");
        assert_eq!(
            err,
            SyncwardError::Config("dead_letter.retention_limit must be greater than 0".to_string())
        );

        let mut config = Config::default();
        config.circuit_breaker.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
