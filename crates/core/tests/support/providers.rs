//! Scripted `SyncProvider` for job-level tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use syncward_core::SyncProvider;
use syncward_domain::{ProviderRecord, SyncError};

/// Provider with a fixed record set, per-record failures and an optional
/// listing failure.
#[derive(Default)]
pub struct ScriptedProvider {
    records: Vec<ProviderRecord>,
    record_errors: HashMap<String, SyncError>,
    listing_error: Mutex<Option<SyncError>>,
    list_calls: AtomicUsize,
    sync_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// `good` records that sync and `bad` records that fail validation.
    pub fn with_records(good: usize, bad: usize) -> Self {
        let mut provider = Self::default();
        for i in 0..good {
            provider.records.push(ProviderRecord::new(format!("rec-{i}")));
        }
        for i in 0..bad {
            let id = format!("broken-{i}");
            provider.records.push(ProviderRecord::new(id.clone()));
            provider
                .record_errors
                .insert(id.clone(), SyncError::data_validation(format!("{id}: missing amount")));
        }
        provider
    }

    /// Make every listing call fail with `error`.
    pub fn failing_listing(error: SyncError) -> Self {
        let provider = Self::default();
        *provider.listing_error.lock() = Some(error);
        provider
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncProvider for ScriptedProvider {
    fn default_limit(&self) -> usize {
        100
    }

    async fn list_records(&self, limit: usize) -> Result<Vec<ProviderRecord>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.listing_error.lock().clone() {
            return Err(err);
        }
        Ok(self.records.iter().take(limit).cloned().collect())
    }

    async fn list_stale_records(&self) -> Result<Vec<ProviderRecord>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.listing_error.lock().clone() {
            return Err(err);
        }
        Ok(self.records.clone())
    }

    async fn sync_record(&self, record: &ProviderRecord) -> Result<(), SyncError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        match self.record_errors.get(&record.id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
