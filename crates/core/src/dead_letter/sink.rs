use std::sync::Arc;

use parking_lot::Mutex;
use syncward_domain::constants::{EVENT_CRITICAL_JOB_ALERT, EVENT_JOB_PERMANENTLY_FAILED};
use syncward_domain::{DeadLetterSettings, FailedJobRecord, Result, SyncwardError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{AlertNotifier, FailedJobStore};

/// Records permanently failed jobs, alerts on critical job classes and keeps
/// the store bounded.
///
/// Pruning runs as a spawned task after each commit so escalation latency
/// does not depend on how many rows need deleting.
pub struct DeadLetterSink {
    store: Arc<dyn FailedJobStore>,
    notifier: Arc<dyn AlertNotifier>,
    settings: DeadLetterSettings,
    pruning: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for DeadLetterSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadLetterSink")
            .field("retention_limit", &self.settings.retention_limit)
            .field("critical_job_classes", &self.settings.critical_job_classes)
            .finish_non_exhaustive()
    }
}

impl DeadLetterSink {
    /// Create a sink over the given store and alert channel.
    pub fn new(
        store: Arc<dyn FailedJobStore>,
        notifier: Arc<dyn AlertNotifier>,
        settings: DeadLetterSettings,
    ) -> Self {
        Self { store, notifier, settings, pruning: Mutex::new(Vec::new()) }
    }

    /// Settings in effect.
    pub const fn settings(&self) -> &DeadLetterSettings {
        &self.settings
    }

    /// Dead-letter one job.
    ///
    /// Logs the failure, persists it, alerts when the job class is critical
    /// and schedules a background prune. Only the insert can fail the
    /// commit; alert and prune failures are logged.
    ///
    /// # Errors
    /// Returns the store's error when the record could not be persisted.
    #[instrument(skip(self, record), fields(job_class = %record.job_class, job_id = %record.job_id))]
    pub async fn commit(&self, record: FailedJobRecord) -> Result<i64> {
        error!(
            event = EVENT_JOB_PERMANENTLY_FAILED,
            job_class = %record.job_class,
            job_id = %record.job_id,
            error_kind = %record.error_kind,
            error_message = %record.error_message,
            executions = record.executions,
            failed_at = %record.failed_at.to_rfc3339(),
            "job permanently failed"
        );

        let id = self.store.insert(&record).await?;

        if self.settings.is_critical(&record.job_class) {
            match self.notifier.notify(&record).await {
                Ok(()) => info!(
                    event = EVENT_CRITICAL_JOB_ALERT,
                    job_class = %record.job_class,
                    job_id = %record.job_id,
                    "critical job alert sent"
                ),
                Err(err) => warn!(
                    job_class = %record.job_class,
                    job_id = %record.job_id,
                    error = %err,
                    "failed to send critical job alert"
                ),
            }
        }

        self.schedule_prune();
        Ok(id)
    }

    fn schedule_prune(&self) {
        let store = Arc::clone(&self.store);
        let keep = self.settings.retention_limit;
        let handle = tokio::spawn(async move {
            match store.prune_to(keep).await {
                Ok(0) => {}
                Ok(deleted) => debug!(deleted, keep, "pruned dead-letter records"),
                Err(err) => warn!(error = %err, keep, "dead-letter prune failed"),
            }
        });

        let mut pending = self.pruning.lock();
        pending.retain(|task| !task.is_finished());
        pending.push(handle);
    }

    /// Wait for every scheduled prune to finish.
    ///
    /// # Errors
    /// Returns `SyncwardError::Internal` if a prune task panicked.
    pub async fn wait_for_pruning(&self) -> Result<()> {
        let pending: Vec<_> = std::mem::take(&mut *self.pruning.lock());
        for task in pending {
            task.await.map_err(|err| SyncwardError::Internal(format!("prune task failed: {err}")))?;
        }
        Ok(())
    }

    /// Prune inline and return the number of deleted records.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn prune_now(&self) -> Result<usize> {
        self.store.prune_to(self.settings.retention_limit).await
    }
}
