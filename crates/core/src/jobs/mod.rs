//! Queue-facing job entry points.

mod sync_job;

pub use sync_job::{SyncJob, SYNC_JOB_CLASS};
