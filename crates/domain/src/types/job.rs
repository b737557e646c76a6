//! Job queue handshake types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{FailedJobRecord, SyncReport};

/// Metadata the queue passes with each execution of a job.
///
/// `executions` is owned by the queue and persisted across re-enqueues;
/// the control layer only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    /// Stable job identifier.
    pub job_id: String,
    /// Attempts already made before this one.
    pub executions: u32,
    /// Serialized job arguments, copied into dead-letter records.
    pub arguments: Value,
}

impl JobContext {
    /// First execution of a new job.
    pub fn new(arguments: Value) -> Self {
        Self { job_id: Uuid::now_v7().to_string(), executions: 0, arguments }
    }

    /// Context for the next attempt of the same job.
    #[must_use]
    pub fn next_attempt(&self) -> Self {
        Self {
            job_id: self.job_id.clone(),
            executions: self.executions.saturating_add(1),
            arguments: self.arguments.clone(),
        }
    }
}

/// How a job execution ended, from the queue's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The pass finished.
    Completed(SyncReport),
    /// Re-enqueue after `delay_secs` with the given execution count.
    RetryScheduled {
        /// Delay before the next attempt.
        delay_secs: u64,
        /// Execution count to persist with the re-enqueued job.
        executions: u32,
    },
    /// Dropped without retry or dead-letter record.
    Discarded,
    /// Retries exhausted; the failure was dead-lettered.
    DeadLettered(FailedJobRecord),
}

impl JobOutcome {
    /// `true` when the queue has nothing further to do with the job.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::RetryScheduled { .. })
    }
}
