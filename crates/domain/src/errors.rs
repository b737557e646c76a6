//! Infrastructure error type used by stores, notifiers and configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Syncward plumbing.
///
/// Provider and job failures use [`crate::SyncError`] instead; this type covers
/// the machinery around them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncwardError {
    /// Persistence layer failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON/TOML encoding or decoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Alert channel failure.
    #[error("Notification error: {0}")]
    Notification(String),

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anything else (task join failures, logging init).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SyncwardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Syncward operations.
pub type Result<T> = std::result::Result<T, SyncwardError>;
