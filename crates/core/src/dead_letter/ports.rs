//! Port interfaces for dead-letter persistence and alerting

use async_trait::async_trait;
use syncward_domain::{FailedJobRecord, Result, StoredFailedJob};

/// Append-only store of permanently failed jobs
#[async_trait]
pub trait FailedJobStore: Send + Sync {
    /// Persist one record in a single transactional write; returns its id
    async fn insert(&self, record: &FailedJobRecord) -> Result<i64>;

    /// Number of persisted records
    async fn count(&self) -> Result<u64>;

    /// Most recent records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<StoredFailedJob>>;

    /// Delete the oldest records so at most `keep` remain; returns how many
    /// were deleted
    async fn prune_to(&self, keep: usize) -> Result<usize>;
}

/// Outbound alert channel for critical job failures
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Raise an alert for a permanently failed critical job
    async fn notify(&self, record: &FailedJobRecord) -> Result<()>;
}
