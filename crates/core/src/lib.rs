//! # Syncward Core
//!
//! Control logic for resilient background synchronization - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Retry classification ([`RetryPolicy`], [`SafetyNet`])
//! - Failure observability ([`ErrorTracker`])
//! - Dead-letter handling ([`DeadLetterSink`])
//! - Sync passes ([`SyncOrchestrator`]) and the job rescue path ([`SyncJob`])
//! - Port interfaces for the provider, failure store and alert channel
//!
//! ## Architecture Principles
//! - Depends only on `syncward-common` and `syncward-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod dead_letter;
pub mod error_tracking;
pub mod jobs;
pub mod retry;
pub mod sync;

pub use dead_letter::{AlertNotifier, DeadLetterSink, FailedJobStore};
pub use error_tracking::ErrorTracker;
pub use jobs::{SyncJob, SYNC_JOB_CLASS};
pub use retry::{RetryPolicy, SafetyNet, SafetyNetAction};
pub use sync::{breaker_error, SyncOrchestrator, SyncProvider};
