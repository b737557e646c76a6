use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use syncward_common::resilience::{CircuitBreaker, Clock, ResilienceError, SystemClock};
use syncward_domain::{ProviderRecord, SyncError, SyncOptions, SyncReport, SyncType};
use tracing::{info, instrument, warn};

use super::ports::SyncProvider;
use crate::error_tracking::ErrorTracker;

/// Translate a breaker outcome into the sync error taxonomy.
pub fn breaker_error(err: ResilienceError<SyncError>) -> SyncError {
    match err {
        ResilienceError::CircuitOpen { retry_after } => {
            SyncError::CircuitOpen { retry_after_secs: retry_after.as_secs() }
        }
        ResilienceError::OperationFailed { source } => source,
    }
}

/// Drives initial and update passes through the shared circuit breaker.
///
/// A failing record is counted, tracked and skipped; only a failure to list
/// records aborts the pass.
pub struct SyncOrchestrator<C: Clock = SystemClock> {
    provider: Arc<dyn SyncProvider>,
    breaker: CircuitBreaker<C>,
    tracker: Arc<ErrorTracker>,
}

impl<C: Clock> SyncOrchestrator<C> {
    /// Create an orchestrator sharing `breaker` and `tracker` with other
    /// components.
    pub fn new(
        provider: Arc<dyn SyncProvider>,
        breaker: CircuitBreaker<C>,
        tracker: Arc<ErrorTracker>,
    ) -> Self {
        Self { provider, breaker, tracker }
    }

    /// Breaker guarding provider calls.
    pub const fn breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    /// Run the pass named by `sync_type`.
    ///
    /// # Errors
    /// Propagates a listing failure or an open breaker at listing time.
    pub async fn run(&self, sync_type: SyncType, options: &SyncOptions) -> Result<SyncReport, SyncError> {
        match sync_type {
            SyncType::Initial => self.initial_sync(options.limit).await,
            SyncType::Update => self.update_sync().await,
        }
    }

    /// Pull up to `limit` records (provider default when `None`) and sync
    /// each one.
    ///
    /// # Errors
    /// Propagates a listing failure or an open breaker at listing time.
    #[instrument(skip(self))]
    pub async fn initial_sync(&self, limit: Option<usize>) -> Result<SyncReport, SyncError> {
        let limit = limit.unwrap_or_else(|| self.provider.default_limit());
        let mut records = self
            .breaker
            .execute(|| self.provider.list_records(limit))
            .await
            .map_err(breaker_error)?;
        records.truncate(limit);

        let report = self.sync_each(SyncType::Initial, records).await;
        info!(sync_type = %SyncType::Initial, synced = report.synced, errors = report.errors, "sync pass finished");
        Ok(report)
    }

    /// Refresh already-known records flagged as stale by the provider.
    ///
    /// # Errors
    /// Propagates a listing failure or an open breaker at listing time.
    #[instrument(skip(self))]
    pub async fn update_sync(&self) -> Result<SyncReport, SyncError> {
        let records = self
            .breaker
            .execute(|| self.provider.list_stale_records())
            .await
            .map_err(breaker_error)?;

        let report = self.sync_each(SyncType::Update, records).await;
        info!(sync_type = %SyncType::Update, synced = report.synced, errors = report.errors, "sync pass finished");
        Ok(report)
    }

    async fn sync_each(&self, sync_type: SyncType, records: Vec<ProviderRecord>) -> SyncReport {
        let mut report = SyncReport::default();

        for record in &records {
            let outcome = self
                .breaker
                .execute(|| self.provider.sync_record(record))
                .await
                .map_err(breaker_error);

            match outcome {
                Ok(()) => report.synced += 1,
                Err(err) => {
                    report.errors += 1;
                    warn!(record_id = %record.id, error = %err, "record sync failed; continuing");
                    self.tracker.record_error(&err, record_context(sync_type, record));
                }
            }
        }

        report
    }
}

fn record_context(sync_type: SyncType, record: &ProviderRecord) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("sync_type".to_string(), json!(sync_type.as_str())),
        ("record_id".to_string(), json!(record.id)),
    ])
}
