//! In-memory implementations of the dead-letter ports
//!
//! Keeps rows in insertion order so pruning semantics match the SQLite
//! adapter without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use syncward_core::{AlertNotifier, FailedJobStore};
use syncward_domain::{FailedJobRecord, Result, StoredFailedJob, SyncwardError};

/// In-memory `FailedJobStore`.
#[derive(Default)]
pub struct InMemoryFailedJobStore {
    rows: Mutex<Vec<StoredFailedJob>>,
    next_id: Mutex<i64>,
    fail_inserts: AtomicBool,
    prune_calls: AtomicUsize,
}

impl InMemoryFailedJobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent insert fail.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<StoredFailedJob> {
        self.rows.lock().clone()
    }

    pub fn prune_calls(&self) -> usize {
        self.prune_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FailedJobStore for InMemoryFailedJobStore {
    async fn insert(&self, record: &FailedJobRecord) -> Result<i64> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SyncwardError::Database("disk I/O error".to_string()));
        }
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.rows.lock().push(StoredFailedJob { id, record: record.clone() });
        Ok(id)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.lock().len() as u64)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredFailedJob>> {
        Ok(self.rows.lock().iter().rev().take(limit).cloned().collect())
    }

    async fn prune_to(&self, keep: usize) -> Result<usize> {
        self.prune_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock();
        let excess = rows.len().saturating_sub(keep);
        rows.drain(..excess);
        Ok(excess)
    }
}

/// `AlertNotifier` that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<FailedJobRecord>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        Arc::new(notifier)
    }

    pub fn sent(&self) -> Vec<FailedJobRecord> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn notify(&self, record: &FailedJobRecord) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SyncwardError::Notification("pager unreachable".to_string()));
        }
        self.sent.lock().push(record.clone());
        Ok(())
    }
}
