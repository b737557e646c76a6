//! Infrastructure-level handling that runs ahead of the retry table.

use serde::{Deserialize, Serialize};
use syncward_domain::{RetrySettings, SyncError};

/// What the safety net decided for an infrastructure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SafetyNetAction {
    /// Retry after a fixed, growing wait.
    Retry {
        /// Delay in seconds.
        delay_secs: u64,
    },
    /// Drop the job: no retry and no dead-letter record.
    Discard,
    /// Attempts used up; hand over to the dead-letter path.
    Escalate,
}

/// Deadlock retries and stale-reference discards.
///
/// Deadlocks get `deadlock_attempts` total executions with a wait of
/// `deadlock_wait_secs * (executions + 1)`. Stale references are discarded.
/// Every other error passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyNet {
    attempts: u32,
    wait_secs: u64,
}

impl SafetyNet {
    /// Build from the retry settings.
    pub const fn new(settings: &RetrySettings) -> Self {
        Self { attempts: settings.deadlock_attempts, wait_secs: settings.deadlock_wait_secs }
    }

    /// `None` when the error is not an infrastructure failure.
    pub fn intercept(&self, error: &SyncError, executions: u32) -> Option<SafetyNetAction> {
        match error {
            SyncError::Deadlock { .. } => {
                let attempt = executions.saturating_add(1);
                if attempt < self.attempts {
                    Some(SafetyNetAction::Retry {
                        delay_secs: self.wait_secs.saturating_mul(u64::from(attempt)),
                    })
                } else {
                    Some(SafetyNetAction::Escalate)
                }
            }
            SyncError::StaleReference { .. } => Some(SafetyNetAction::Discard),
            _ => None,
        }
    }
}

impl Default for SafetyNet {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}
