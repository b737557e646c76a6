//! Failure-counting circuit breaker guarding calls to an unreliable
//! dependency.
//!
//! State machine:
//! - success (any state): `failure_count = 0`, state becomes `Closed`
//! - failure: `failure_count += 1` and `last_failure_at = now`; the breaker
//!   opens once the count reaches the threshold, and a failure seen while
//!   `Closed` below the threshold moves it to `HalfOpen`
//! - `is_open()` is true only while `Open` *and* inside the timeout window
//!   that started at the last failure. Expiry lets calls through without
//!   rewriting the stored state; the next recorded outcome does that.
//!
//! All bookkeeping lives behind one mutex so concurrent workers sharing a
//! breaker never observe a torn `(state, failure_count)` pair.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};

/// Default number of failures that opens the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default length of the open window.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(60);

//==============================================================================
// Error Types
//==============================================================================

/// Breaker configuration rejected by validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field is out of range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What was wrong.
        message: String,
    },
}

/// Configuration result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Outcome of a call routed through a [`CircuitBreaker`].
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The breaker is open; the wrapped operation was not invoked.
    #[error("Circuit breaker is open, retry after {}s", retry_after.as_secs())]
    CircuitOpen {
        /// Remaining open window, rounded up to whole seconds.
        retry_after: Duration,
    },

    /// The operation ran and failed. The failure has been recorded.
    #[error("Operation failed: {source}")]
    OperationFailed {
        /// Error returned by the operation.
        #[source]
        source: E,
    },
}

impl<E> ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// `true` when the call was short-circuited.
    pub const fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// The operation's own error, if it ran.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::OperationFailed { source } => Some(source),
            Self::CircuitOpen { .. } => None,
        }
    }
}

/// Result type for breaker-wrapped operations.
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

//==============================================================================
// State & Configuration
//==============================================================================

/// Stored breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy; no failures since the last success.
    Closed,
    /// Failure threshold reached; calls are rejected inside the window.
    Open,
    /// At least one failure since the last success, below the threshold.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        };
        f.write_str(label)
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Failures (since the last success) that open the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open after the most recent failure.
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: DEFAULT_FAILURE_THRESHOLD, timeout: DEFAULT_OPEN_TIMEOUT }
    }
}

impl CircuitBreakerConfig {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    /// Reject zero thresholds and zero-length windows.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Failures that open the breaker.
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Open window length.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Point-in-time copy of the breaker's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// Stored state (not adjusted for window expiry).
    pub state: CircuitState,
    /// Failures since the last success.
    pub failure_count: u32,
    /// Instant of the most recent failure.
    pub last_failure_at: Option<Instant>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl Inner {
    const fn closed() -> Self {
        Self { state: CircuitState::Closed, failure_count: 0, last_failure_at: None }
    }
}

//==============================================================================
// Circuit Breaker
//==============================================================================

/// Shared circuit breaker. Clones observe and mutate the same state.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<Inner>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &snapshot.state)
            .field("failure_count", &snapshot.failure_count)
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Breaker on the system clock.
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for CircuitBreaker<SystemClock> {
    fn default() -> Self {
        Self::from_parts(CircuitBreakerConfig::default(), SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Breaker on a caller-supplied clock.
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, clock))
    }

    fn from_parts(config: CircuitBreakerConfig, clock: C) -> Self {
        Self { config, inner: Arc::new(Mutex::new(Inner::closed())), clock: Arc::new(clock) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("circuit breaker lock poisoned; recovering state");
                poisoned.into_inner()
            }
        }
    }

    /// Configuration in effect.
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Remaining open window, or `None` when calls may proceed.
    fn open_remaining(&self) -> Option<Duration> {
        let inner = self.lock();
        if inner.state != CircuitState::Open {
            return None;
        }
        let last_failure = inner.last_failure_at?;
        let elapsed = self.clock.now().saturating_duration_since(last_failure);
        self.config.timeout.checked_sub(elapsed).filter(|remaining| !remaining.is_zero())
    }

    /// `true` while the breaker is open and the window has not elapsed.
    pub fn is_open(&self) -> bool {
        self.open_remaining().is_some()
    }

    /// Run a synchronous operation through the breaker.
    ///
    /// When open, returns [`ResilienceError::CircuitOpen`] without invoking
    /// `operation`.
    #[instrument(skip(self, operation), fields(state = %self.get_state()))]
    pub fn call<F, T, E>(&self, operation: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.guard()?;
        self.settle(operation())
    }

    /// Run an asynchronous operation through the breaker.
    ///
    /// The lock is never held across the await point.
    #[instrument(skip(self, operation), fields(state = %self.get_state()))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.guard()?;
        let outcome = operation().await;
        self.settle(outcome)
    }

    fn guard<E>(&self) -> ResilienceResult<(), E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self.open_remaining() {
            Some(remaining) => {
                let retry_after = round_up_to_secs(remaining);
                debug!(retry_after_secs = retry_after.as_secs(), "circuit breaker rejecting call");
                Err(ResilienceError::CircuitOpen { retry_after })
            }
            None => Ok(()),
        }
    }

    fn settle<T, E>(&self, outcome: Result<T, E>) -> ResilienceResult<T, E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match outcome {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(source) => {
                self.record_failure();
                debug!(error = %source, "circuit breaker recorded operation failure");
                Err(ResilienceError::OperationFailed { source })
            }
        }
    }

    /// Reset to `Closed` with a zero failure count.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
        drop(inner);

        if previous != CircuitState::Closed {
            info!(from = %previous, "circuit breaker closed after success");
        }
    }

    /// Count a failure and advance the state machine.
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_at = Some(now);

        let previous = inner.state;
        if inner.failure_count >= self.config.failure_threshold {
            inner.state = CircuitState::Open;
        } else if inner.state == CircuitState::Closed {
            inner.state = CircuitState::HalfOpen;
        }
        let (state, failure_count) = (inner.state, inner.failure_count);
        drop(inner);

        if state == CircuitState::Open && previous != CircuitState::Open {
            warn!(
                failure_count,
                threshold = self.config.failure_threshold,
                timeout_secs = self.config.timeout.as_secs(),
                "circuit breaker opened"
            );
        } else if state != previous {
            debug!(from = %previous, to = %state, failure_count, "circuit breaker transition");
        }
    }

    /// Stored state.
    pub fn get_state(&self) -> CircuitState {
        self.lock().state
    }

    /// Failures since the last success.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Copy of all bookkeeping under a single lock acquisition.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_at: inner.last_failure_at,
        }
    }
}

fn round_up_to_secs(remaining: Duration) -> Duration {
    let whole = remaining.as_secs();
    let secs = if remaining.subsec_nanos() > 0 { whole + 1 } else { whole };
    Duration::from_secs(secs.max(1))
}
