//! Control-layer constants
//!
//! Defaults for every tunable plus the fixed limits on recorded frames.

// Circuit breaker
pub const DEFAULT_BREAKER_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_BREAKER_TIMEOUT_SECS: u64 = 60;

// Retry policy
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 600;
pub const DEFAULT_API_MAX_EXECUTIONS: u32 = 5;
pub const DEFAULT_GENERIC_MAX_EXECUTIONS: u32 = 3;

// Infrastructure safety net
pub const DEFAULT_DEADLOCK_ATTEMPTS: u32 = 3;
pub const DEFAULT_DEADLOCK_WAIT_SECS: u64 = 5;

// Error tracker
pub const DEFAULT_ERROR_TRACKER_CAPACITY: usize = 100;
pub const ERROR_SUMMARY_RECENT: usize = 10;
pub const MAX_ERROR_RECORD_BACKTRACE_FRAMES: usize = 5;

// Dead letters
pub const DEFAULT_DEAD_LETTER_RETENTION: usize = 1000;
pub const MAX_DEAD_LETTER_BACKTRACE_FRAMES: usize = 10;

// Database
pub const DEFAULT_DB_PATH: &str = "syncward.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

// Structured log event names
pub const EVENT_SYNC_ERROR: &str = "sync_error";
pub const EVENT_JOB_PERMANENTLY_FAILED: &str = "job_permanently_failed";
pub const EVENT_JOB_DISCARDED: &str = "job_discarded";
pub const EVENT_CRITICAL_JOB_ALERT: &str = "critical_job_failed";
