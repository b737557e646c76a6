//! Domain data types.

pub mod failure;
pub mod job;
pub mod sync;

pub use failure::{ErrorRecord, ErrorSummary, FailedJobRecord, RetryDecision, StoredFailedJob};
pub use job::{JobContext, JobOutcome};
pub use sync::{ProviderRecord, SyncOptions, SyncReport, SyncType};
