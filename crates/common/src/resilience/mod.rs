//! Resilience primitives for calls into unreliable dependencies.
//!
//! Nothing here knows about sync jobs or providers. The breaker is generic
//! over the wrapped operation's error type and over its [`Clock`], so the
//! domain layers decide what a failure means and tests control time.

pub mod circuit_breaker;
pub mod clock;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitSnapshot,
    CircuitState, ConfigError, ConfigResult, ResilienceError, ResilienceResult,
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_OPEN_TIMEOUT,
};
pub use clock::{Clock, MockClock, SystemClock};
