//! Failure bookkeeping: tracker records, retry decisions and dead-letter
//! rows.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{MAX_DEAD_LETTER_BACKTRACE_FRAMES, MAX_ERROR_RECORD_BACKTRACE_FRAMES};
use crate::sync_error::error_chain;
use crate::{ErrorKind, SyncError};

/// One observed failure, as kept by the in-memory error tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Error class.
    pub error_kind: ErrorKind,
    /// Error message without the kind prefix.
    pub message: String,
    /// Caller-supplied context (job id, record id, sync type, ...).
    pub context: BTreeMap<String, Value>,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
    /// Rendered cause chain, outermost first.
    pub backtrace: Vec<String>,
}

impl ErrorRecord {
    /// Build a record for `error` observed now.
    pub fn capture(error: &SyncError, context: BTreeMap<String, Value>) -> Self {
        Self {
            error_kind: error.kind(),
            message: error.message(),
            context,
            timestamp: Utc::now(),
            backtrace: error_chain(error, MAX_ERROR_RECORD_BACKTRACE_FRAMES),
        }
    }
}

/// Snapshot returned by the error tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Every error ever recorded, including those displaced from the ring.
    pub total_errors: u64,
    /// Records currently retained in the ring.
    pub retained_errors: usize,
    /// Cumulative count per kind.
    pub error_kind_counts: BTreeMap<ErrorKind, u64>,
    /// The ten most recent records, oldest first.
    pub last_10_errors: Vec<ErrorRecord>,
    /// Kind with the highest cumulative count.
    pub most_frequent_error_kind: Option<ErrorKind>,
}

/// What the rescue path should do with a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RetryDecision {
    /// Re-enqueue after the given delay.
    Retry {
        /// Delay in seconds.
        delay_secs: u64,
    },
    /// Stop retrying and dead-letter the job.
    Escalate,
}

impl RetryDecision {
    /// Delay as a [`Duration`], if retrying.
    pub const fn delay(&self) -> Option<Duration> {
        match self {
            Self::Retry { delay_secs } => Some(Duration::from_secs(*delay_secs)),
            Self::Escalate => None,
        }
    }

    /// `true` for [`RetryDecision::Escalate`].
    pub const fn is_escalate(&self) -> bool {
        matches!(self, Self::Escalate)
    }
}

/// Durable record of a job that exhausted its retries.
///
/// Built once on escalation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedJobRecord {
    /// Job type name.
    pub job_class: String,
    /// Queue-assigned job identifier.
    pub job_id: String,
    /// Serialized job arguments.
    pub arguments: Value,
    /// Wire name of the final error kind.
    pub error_kind: String,
    /// Final error message.
    pub error_message: String,
    /// Up to ten frames joined by `'\n'`.
    pub backtrace: String,
    /// When the job was abandoned.
    pub failed_at: DateTime<Utc>,
    /// Executions made before escalation.
    pub executions: u32,
}

impl FailedJobRecord {
    /// Build a record for a job abandoned now because of `error`.
    pub fn from_error(
        job_class: impl Into<String>,
        job_id: impl Into<String>,
        arguments: Value,
        error: &SyncError,
        executions: u32,
    ) -> Self {
        let frames = error_chain(error, MAX_DEAD_LETTER_BACKTRACE_FRAMES);
        Self {
            job_class: job_class.into(),
            job_id: job_id.into(),
            arguments,
            error_kind: error.kind().as_str().to_string(),
            error_message: error.message(),
            backtrace: frames.join("\n"),
            failed_at: Utc::now(),
            executions,
        }
    }

    /// Replace the backtrace with `frames`, keeping at most ten.
    #[must_use]
    pub fn with_backtrace<S: AsRef<str>>(mut self, frames: &[S]) -> Self {
        self.backtrace = frames
            .iter()
            .take(MAX_DEAD_LETTER_BACKTRACE_FRAMES)
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        self
    }

    /// Override the failure timestamp.
    #[must_use]
    pub fn with_failed_at(mut self, at: DateTime<Utc>) -> Self {
        self.failed_at = at;
        self
    }
}

/// A dead-letter row read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFailedJob {
    /// Storage identifier (insertion order).
    pub id: i64,
    /// The persisted record.
    #[serde(flatten)]
    pub record: FailedJobRecord,
}
