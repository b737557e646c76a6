//! Closed taxonomy of failures a sync job can observe.
//!
//! Provider failures (`RateLimited`, `Authentication`, `NotFound`, `Api`,
//! `Network`, `DataValidation`), the breaker's own rejection
//! (`CircuitOpen`), caller mistakes (`InvalidArgument`) and the two
//! infrastructure classes handled by the job safety net (`Deadlock`,
//! `StaleReference`). Anything else a provider adapter cannot classify is
//! reported as `Unexpected`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Free-form structured details attached to a provider failure.
pub type ErrorDetails = BTreeMap<String, Value>;

/// Stable name of each error class, used in logs, counters and the
/// dead-letter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// `RateLimitError`
    #[serde(rename = "RateLimitError")]
    RateLimit,
    /// `AuthenticationError`
    #[serde(rename = "AuthenticationError")]
    Authentication,
    /// `NotFoundError`
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// `ApiError`
    #[serde(rename = "ApiError")]
    Api,
    /// `NetworkError`
    #[serde(rename = "NetworkError")]
    Network,
    /// `DataValidationError`
    #[serde(rename = "DataValidationError")]
    DataValidation,
    /// `CircuitOpenError`
    #[serde(rename = "CircuitOpenError")]
    CircuitOpen,
    /// `ArgumentError`
    #[serde(rename = "ArgumentError")]
    InvalidArgument,
    /// `DeadlockError`
    #[serde(rename = "DeadlockError")]
    Deadlock,
    /// `StaleReferenceError`
    #[serde(rename = "StaleReferenceError")]
    StaleReference,
    /// `UnexpectedError`
    #[serde(rename = "UnexpectedError")]
    Unexpected,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::RateLimit,
        Self::Authentication,
        Self::NotFound,
        Self::Api,
        Self::Network,
        Self::DataValidation,
        Self::CircuitOpen,
        Self::InvalidArgument,
        Self::Deadlock,
        Self::StaleReference,
        Self::Unexpected,
    ];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimit => "RateLimitError",
            Self::Authentication => "AuthenticationError",
            Self::NotFound => "NotFoundError",
            Self::Api => "ApiError",
            Self::Network => "NetworkError",
            Self::DataValidation => "DataValidationError",
            Self::CircuitOpen => "CircuitOpenError",
            Self::InvalidArgument => "ArgumentError",
            Self::Deadlock => "DeadlockError",
            Self::StaleReference => "StaleReferenceError",
            Self::Unexpected => "UnexpectedError",
        }
    }

    /// Kinds that need an operator: credentials or a tripped breaker.
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Authentication | Self::CircuitOpen)
    }

    /// Members of the API family (`ApiError` and its subtypes).
    pub const fn is_api_family(self) -> bool {
        matches!(self, Self::Api | Self::RateLimit | Self::Authentication | Self::NotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown error kind name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);

impl FromStr for ErrorKind {
    type Err = UnknownErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownErrorKind(s.to_string()))
    }
}

/// A classified sync failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Provider asked us to slow down.
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        /// Provider message.
        message: String,
        /// Explicit wait requested by the provider, in seconds.
        retry_after_secs: Option<u64>,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// Credentials were rejected.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Provider message.
        message: String,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// The provider does not know the requested entity.
    #[error("Not found: {message}")]
    NotFound {
        /// Provider message.
        message: String,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// Any other provider API failure.
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        /// Provider message.
        message: String,
        /// HTTP status, when the transport has one.
        status: Option<u16>,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// Connection-level failure (DNS, reset, timeout).
    #[error("Network error: {message}")]
    Network {
        /// Transport message.
        message: String,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// The provider returned data we could not accept.
    #[error("Data validation failed: {message}")]
    DataValidation {
        /// Validation message.
        message: String,
        /// Extra structured context.
        details: ErrorDetails,
    },

    /// The circuit breaker rejected the call without reaching the provider.
    #[error("Circuit breaker is open, retry after {retry_after_secs}s")]
    CircuitOpen {
        /// Remaining open window in seconds.
        retry_after_secs: u64,
    },

    /// Caller error such as an unknown sync type.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// Storage deadlock seen by the worker infrastructure.
    #[error("Deadlock detected: {message}")]
    Deadlock {
        /// Driver message.
        message: String,
    },

    /// A record referenced by the job no longer exists.
    #[error("Stale reference: {message}")]
    StaleReference {
        /// Which reference went missing.
        message: String,
    },

    /// Failure outside the taxonomy.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Rendered error.
        message: String,
    },
}

impl SyncError {
    /// Rate limit with an optional explicit wait.
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited { message: message.into(), retry_after_secs, details: ErrorDetails::new() }
    }

    /// Rejected credentials.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into(), details: ErrorDetails::new() }
    }

    /// Missing remote entity.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into(), details: ErrorDetails::new() }
    }

    /// Generic API failure.
    pub fn api(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Api { message: message.into(), status, details: ErrorDetails::new() }
    }

    /// Transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), details: ErrorDetails::new() }
    }

    /// Unacceptable provider data.
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation { message: message.into(), details: ErrorDetails::new() }
    }

    /// Caller mistake.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Unclassified failure.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected { message: message.into() }
    }

    /// Classify an HTTP response status from the provider.
    ///
    /// 401/403 are credential problems, 404 a missing entity, 429 a rate
    /// limit; every other status is a generic API error.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::authentication(message),
            404 => Self::not_found(message),
            429 => Self::rate_limited(message, retry_after_secs),
            _ => Self::api(message, Some(status)),
        }
    }

    /// Attach a structured detail. No-op for variants without details.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(details) = self.details_mut() {
            details.insert(key.into(), value.into());
        }
        self
    }

    fn details_mut(&mut self) -> Option<&mut ErrorDetails> {
        match self {
            Self::RateLimited { details, .. }
            | Self::Authentication { details, .. }
            | Self::NotFound { details, .. }
            | Self::Api { details, .. }
            | Self::Network { details, .. }
            | Self::DataValidation { details, .. } => Some(details),
            _ => None,
        }
    }

    /// Structured details, if the variant carries any.
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::RateLimited { details, .. }
            | Self::Authentication { details, .. }
            | Self::NotFound { details, .. }
            | Self::Api { details, .. }
            | Self::Network { details, .. }
            | Self::DataValidation { details, .. } => Some(details),
            _ => None,
        }
    }

    /// Error class.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Api { .. } => ErrorKind::Api,
            Self::Network { .. } => ErrorKind::Network,
            Self::DataValidation { .. } => ErrorKind::DataValidation,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Deadlock { .. } => ErrorKind::Deadlock,
            Self::StaleReference { .. } => ErrorKind::StaleReference,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::RateLimited { message, .. }
            | Self::Authentication { message, .. }
            | Self::NotFound { message, .. }
            | Self::Api { message, .. }
            | Self::Network { message, .. }
            | Self::DataValidation { message, .. }
            | Self::InvalidArgument { message }
            | Self::Deadlock { message }
            | Self::StaleReference { message }
            | Self::Unexpected { message } => message.clone(),
            Self::CircuitOpen { .. } => self.to_string(),
        }
    }

    /// Explicit wait carried by the error (rate limit or open breaker).
    pub const fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs, .. } => *retry_after_secs,
            Self::CircuitOpen { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Render an error's cause chain, outermost first, capped at `limit` frames.
pub fn error_chain(error: &(dyn std::error::Error + 'static), limit: usize) -> Vec<String> {
    let mut frames = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        if frames.len() >= limit {
            break;
        }
        frames.push(err.to_string());
        current = err.source();
    }
    frames
}
