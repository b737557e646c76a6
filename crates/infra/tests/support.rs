#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::json;
use syncward_core::{AlertNotifier, SyncProvider};
use syncward_domain::{FailedJobRecord, ProviderRecord, Result, SyncError};
use syncward_infra::database::{DbManager, SqliteFailedJobRepository};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated temporary database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), temp_dir }
    }

    /// Repository over this database.
    pub fn repository(&self) -> SqliteFailedJobRepository {
        SqliteFailedJobRepository::new(Arc::clone(&self.manager))
    }

    /// Directory holding the database file.
    pub fn dir(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed base timestamp for deterministic ordering.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp")
}

/// Dead-letter record for `job_id` failing `offset_secs` after [`base_time`].
pub fn failed_record(job_class: &str, job_id: &str, offset_secs: i64) -> FailedJobRecord {
    FailedJobRecord::from_error(
        job_class,
        job_id,
        json!(["update", {"limit": null}]),
        &SyncError::network("connection reset by peer"),
        6,
    )
    .with_backtrace(&["sync_record", "update_sync"])
    .with_failed_at(base_time() + chrono::Duration::seconds(offset_secs))
}

/// `AlertNotifier` that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<FailedJobRecord>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<FailedJobRecord> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn notify(&self, record: &FailedJobRecord) -> Result<()> {
        self.sent.lock().push(record.clone());
        Ok(())
    }
}

/// Provider whose listing either succeeds with `records` healthy records or
/// fails with a fixed error.
pub struct StubProvider {
    records: usize,
    listing_error: Option<SyncError>,
    list_calls: AtomicUsize,
}

impl StubProvider {
    pub fn healthy(records: usize) -> Arc<Self> {
        Arc::new(Self { records, listing_error: None, list_calls: AtomicUsize::new(0) })
    }

    pub fn failing(error: SyncError) -> Arc<Self> {
        Arc::new(Self { records: 0, listing_error: Some(error), list_calls: AtomicUsize::new(0) })
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn listing(&self, limit: usize) -> std::result::Result<Vec<ProviderRecord>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.listing_error {
            Some(err) => Err(err.clone()),
            None => Ok((0..self.records.min(limit))
                .map(|i| ProviderRecord::new(format!("rec-{i}")))
                .collect()),
        }
    }
}

#[async_trait]
impl SyncProvider for StubProvider {
    fn default_limit(&self) -> usize {
        100
    }

    async fn list_records(&self, limit: usize) -> std::result::Result<Vec<ProviderRecord>, SyncError> {
        self.listing(limit)
    }

    async fn list_stale_records(&self) -> std::result::Result<Vec<ProviderRecord>, SyncError> {
        self.listing(usize::MAX)
    }

    async fn sync_record(&self, _record: &ProviderRecord) -> std::result::Result<(), SyncError> {
        Ok(())
    }
}
