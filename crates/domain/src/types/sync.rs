//! Sync pass inputs and outputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SyncError;

/// Which pass a sync job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// Pull records from the provider for the first time.
    Initial,
    /// Refresh entities already known locally.
    Update,
}

impl SyncType {
    /// Argument value accepted by the job entry point.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "update" => Ok(Self::Update),
            other => Err(SyncError::invalid_argument(format!(
                "unknown sync type '{other}' (expected 'initial' or 'update')"
            ))),
        }
    }
}

/// Options accepted by the job entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Maximum records to pull in an initial pass. `None` uses the
    /// provider's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SyncOptions {
    /// Options with an explicit limit.
    pub const fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// Per-record tally of a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Records synchronised successfully.
    pub synced: u64,
    /// Records that failed and were skipped.
    pub errors: u64,
}

impl SyncReport {
    /// Records attempted.
    pub const fn attempted(&self) -> u64 {
        self.synced + self.errors
    }
}

/// Opaque record handed over by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider-side identifier.
    pub id: String,
    /// Raw payload; interpretation belongs to the provider.
    #[serde(default)]
    pub payload: Value,
}

impl ProviderRecord {
    /// Record with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), payload: Value::Null }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parses_known_sync_types() {
        assert_eq!("initial".parse::<SyncType>(), Ok(SyncType::Initial));
        assert_eq!("update".parse::<SyncType>(), Ok(SyncType::Update));
    }

    #[test]
    fn unknown_sync_type_is_an_argument_error() {
        let err = "full".parse::<SyncType>().expect_err("unknown type");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("'full'"));
    }

    #[test]
    fn options_default_to_provider_limit() {
        let options: SyncOptions = serde_json::from_str("{}").expect("empty options parse");
        assert_eq!(options.limit, None);
        assert_eq!(SyncOptions::with_limit(10).limit, Some(10));
    }

    #[test]
    fn report_counts_attempts() {
        let report = SyncReport { synced: 8, errors: 2 };
        assert_eq!(report.attempted(), 10);
    }
}
