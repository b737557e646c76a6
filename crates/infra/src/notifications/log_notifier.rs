use async_trait::async_trait;
use syncward_core::AlertNotifier;
use syncward_domain::constants::EVENT_CRITICAL_JOB_ALERT;
use syncward_domain::{FailedJobRecord, Result};
use tracing::error;

/// Alert notifier that raises an `ERROR` event on the `syncward::alerts`
/// target.
///
/// Log shippers route that target to paging; deployments without one still
/// get the alert in the application log.
#[derive(Debug, Clone, Default)]
pub struct LogAlertNotifier;

impl LogAlertNotifier {
    /// Create the notifier.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertNotifier for LogAlertNotifier {
    async fn notify(&self, record: &FailedJobRecord) -> Result<()> {
        error!(
            target: "syncward::alerts",
            event = EVENT_CRITICAL_JOB_ALERT,
            job_class = %record.job_class,
            job_id = %record.job_id,
            error_kind = %record.error_kind,
            error_message = %record.error_message,
            executions = record.executions,
            "critical job permanently failed"
        );
        Ok(())
    }
}
