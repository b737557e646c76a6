//! Conversions from external infrastructure errors into domain errors.

use rusqlite::Error as SqlError;
use syncward_domain::{SyncError, SyncwardError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncwardError);

impl From<InfraError> for SyncwardError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncwardError> for InfraError {
    fn from(value: SyncwardError) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

trait IntoSyncwardError {
    fn into_syncward(self) -> SyncwardError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SyncwardError */
/* -------------------------------------------------------------------------- */

impl IntoSyncwardError for SqlError {
    fn into_syncward(self) -> SyncwardError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SyncwardError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SyncwardError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SyncwardError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 1299) => {
                        SyncwardError::Database("not null constraint violation".into())
                    }
                    _ => SyncwardError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SyncwardError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SyncwardError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                SyncwardError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => SyncwardError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => SyncwardError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_syncward())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2 / serde_json → SyncwardError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(SyncwardError::Database(format!("connection pool error: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(SyncwardError::Serialization(value.to_string()))
    }
}

/// Classify a SQLite failure raised inside a job into the sync taxonomy.
///
/// Lock contention maps to [`SyncError::Deadlock`] and a vanished row to
/// [`SyncError::StaleReference`], so the safety net can retry or discard the
/// job. Everything else is unexpected.
pub fn classify_sqlite_failure(err: &SqlError) -> SyncError {
    use rusqlite::ffi::ErrorCode;

    match err {
        SqlError::SqliteFailure(inner, _)
            if matches!(inner.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            SyncError::Deadlock { message: err.to_string() }
        }
        SqlError::QueryReturnedNoRows => {
            SyncError::StaleReference { message: err.to_string() }
        }
        other => SyncError::unexpected(other.to_string()),
    }
}
