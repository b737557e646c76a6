//! The background sync job and its rescue path.
//!
//! The queue calls [`SyncJob::run`] with the job's metadata and gets back a
//! [`JobOutcome`]. Failures pass through, in order: the error tracker, the
//! infrastructure safety net, the retry policy, and finally the dead-letter
//! sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use syncward_common::resilience::{Clock, SystemClock};
use syncward_domain::constants::EVENT_JOB_DISCARDED;
use syncward_domain::{
    FailedJobRecord, JobContext, JobOutcome, Result, RetryDecision, SyncError, SyncOptions,
    SyncReport, SyncType,
};
use tracing::{info, instrument, warn};

use crate::dead_letter::DeadLetterSink;
use crate::error_tracking::ErrorTracker;
use crate::retry::{RetryPolicy, SafetyNet, SafetyNetAction};
use crate::sync::SyncOrchestrator;

/// Job class recorded for sync jobs unless overridden.
pub const SYNC_JOB_CLASS: &str = "SyncJob";

/// Background sync job.
pub struct SyncJob<C: Clock = SystemClock> {
    job_class: String,
    orchestrator: SyncOrchestrator<C>,
    tracker: Arc<ErrorTracker>,
    policy: RetryPolicy,
    safety_net: SafetyNet,
    sink: Arc<DeadLetterSink>,
}

impl<C: Clock> SyncJob<C> {
    /// Assemble a job from its collaborators.
    pub fn new(
        orchestrator: SyncOrchestrator<C>,
        tracker: Arc<ErrorTracker>,
        policy: RetryPolicy,
        sink: Arc<DeadLetterSink>,
    ) -> Self {
        let safety_net = SafetyNet::new(policy.settings());
        Self {
            job_class: SYNC_JOB_CLASS.to_string(),
            orchestrator,
            tracker,
            policy,
            safety_net,
            sink,
        }
    }

    /// Record failures under a different job class.
    #[must_use]
    pub fn with_job_class(mut self, job_class: impl Into<String>) -> Self {
        self.job_class = job_class.into();
        self
    }

    /// Job class written to logs and dead-letter records.
    pub fn job_class(&self) -> &str {
        &self.job_class
    }

    /// Serialized arguments for enqueueing a sync job.
    pub fn arguments(sync_type: SyncType, options: &SyncOptions) -> Value {
        json!([sync_type.as_str(), options])
    }

    /// Job body: parse the sync type and run the pass.
    ///
    /// # Errors
    /// An unrecognised `sync_type` fails with `SyncError::InvalidArgument`
    /// before the provider is contacted; otherwise orchestrator errors are
    /// returned as-is.
    pub async fn perform(&self, sync_type: &str, options: &SyncOptions) -> std::result::Result<SyncReport, SyncError> {
        let sync_type: SyncType = sync_type.parse()?;
        self.orchestrator.run(sync_type, options).await
    }

    /// Execute once and tell the queue what to do next.
    ///
    /// # Errors
    /// Only when a dead-letter record cannot be persisted.
    #[instrument(skip(self, ctx, options), fields(job_class = %self.job_class, job_id = %ctx.job_id, executions = ctx.executions))]
    pub async fn run(&self, ctx: &JobContext, sync_type: &str, options: &SyncOptions) -> Result<JobOutcome> {
        match self.perform(sync_type, options).await {
            Ok(report) => {
                info!(synced = report.synced, errors = report.errors, "sync job completed");
                Ok(JobOutcome::Completed(report))
            }
            Err(err) => self.rescue(ctx, sync_type, &err).await,
        }
    }

    /// Route a failed execution to retry, discard or dead-letter.
    ///
    /// # Errors
    /// Only when a dead-letter record cannot be persisted.
    pub async fn rescue(&self, ctx: &JobContext, sync_type: &str, err: &SyncError) -> Result<JobOutcome> {
        self.tracker.record_error(err, self.failure_context(ctx, sync_type));

        let decision = match self.safety_net.intercept(err, ctx.executions) {
            Some(SafetyNetAction::Discard) => {
                warn!(
                    event = EVENT_JOB_DISCARDED,
                    job_class = %self.job_class,
                    job_id = %ctx.job_id,
                    error_kind = %err.kind(),
                    error_message = %err.message(),
                    "discarding job whose referenced record no longer exists"
                );
                return Ok(JobOutcome::Discarded);
            }
            Some(SafetyNetAction::Retry { delay_secs }) => RetryDecision::Retry { delay_secs },
            Some(SafetyNetAction::Escalate) => RetryDecision::Escalate,
            None => self.policy.decide(err, ctx.executions),
        };

        match decision {
            RetryDecision::Retry { delay_secs } => {
                let executions = ctx.executions.saturating_add(1);
                info!(error_kind = %err.kind(), delay_secs, executions, "sync job retry scheduled");
                Ok(JobOutcome::RetryScheduled { delay_secs, executions })
            }
            RetryDecision::Escalate => {
                let record = FailedJobRecord::from_error(
                    self.job_class.clone(),
                    ctx.job_id.clone(),
                    ctx.arguments.clone(),
                    err,
                    ctx.executions.saturating_add(1),
                );
                self.sink.commit(record.clone()).await?;
                Ok(JobOutcome::DeadLettered(record))
            }
        }
    }

    fn failure_context(&self, ctx: &JobContext, sync_type: &str) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("job_class".to_string(), json!(self.job_class)),
            ("job_id".to_string(), json!(ctx.job_id)),
            ("executions".to_string(), json!(ctx.executions)),
            ("sync_type".to_string(), json!(sync_type)),
        ])
    }
}
