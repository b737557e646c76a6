use syncward_domain::{RetryDecision, RetrySettings, SyncError};
use tracing::debug;

/// Classifies a failure and the executions already made into a
/// [`RetryDecision`].
///
/// Decision table, first match wins:
/// 1. rate limit: retry after the provider's `retry_after`, else backoff
/// 2. authentication or open breaker: escalate immediately
/// 3. network or API family: backoff while `executions < api_max_executions`
/// 4. anything else: backoff while `executions < generic_max_executions`
///
/// Backoff is `min(2^executions, max_backoff_secs)` seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    settings: RetrySettings,
}

impl RetryPolicy {
    /// Policy with explicit limits.
    pub const fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    /// Limits in effect.
    pub const fn settings(&self) -> &RetrySettings {
        &self.settings
    }

    /// Apply the decision table.
    pub fn decide(&self, error: &SyncError, executions: u32) -> RetryDecision {
        let decision = match error {
            SyncError::RateLimited { retry_after_secs, .. } => {
                match self.settings.rate_limit_max_retries {
                    Some(max) if executions >= max => RetryDecision::Escalate,
                    _ => RetryDecision::Retry {
                        delay_secs: retry_after_secs
                            .unwrap_or_else(|| self.backoff_secs(executions)),
                    },
                }
            }
            SyncError::Authentication { .. } | SyncError::CircuitOpen { .. } => {
                RetryDecision::Escalate
            }
            SyncError::Network { .. } | SyncError::Api { .. } | SyncError::NotFound { .. } => {
                self.bounded(executions, self.settings.api_max_executions)
            }
            SyncError::DataValidation { .. }
            | SyncError::InvalidArgument { .. }
            | SyncError::Deadlock { .. }
            | SyncError::StaleReference { .. }
            | SyncError::Unexpected { .. } => {
                self.bounded(executions, self.settings.generic_max_executions)
            }
        };

        debug!(error_kind = %error.kind(), executions, ?decision, "retry decision");
        decision
    }

    /// Exponential backoff for the given execution count, capped.
    pub fn backoff_secs(&self, executions: u32) -> u64 {
        2_u64.saturating_pow(executions).min(self.settings.max_backoff_secs)
    }

    fn bounded(&self, executions: u32, max_executions: u32) -> RetryDecision {
        if executions < max_executions {
            RetryDecision::Retry { delay_secs: self.backoff_secs(executions) }
        } else {
            RetryDecision::Escalate
        }
    }
}
