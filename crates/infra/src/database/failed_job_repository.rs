//! SQLite implementation of the dead-letter store.
//!
//! Rows are append-only. Ordering is `failed_at` then `id`, so records that
//! share a timestamp still prune in insertion order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use syncward_core::FailedJobStore;
use syncward_domain::{FailedJobRecord, Result, StoredFailedJob, SyncwardError};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "id, job_class, job_id, arguments, error_kind, error_message, \
                              backtrace, failed_at, executions";

/// Dead-letter repository over the pooled SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteFailedJobRepository {
    db: Arc<DbManager>,
}

impl SqliteFailedJobRepository {
    /// Create a repository; the schema must already be migrated.
    pub const fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Records for one job class, newest first.
    ///
    /// # Errors
    /// Returns `SyncwardError::Database` on query failure.
    pub async fn recent_for_class(
        &self,
        job_class: &str,
        limit: usize,
    ) -> Result<Vec<StoredFailedJob>> {
        let db = Arc::clone(&self.db);
        let job_class = job_class.to_string();

        task::spawn_blocking(move || -> Result<Vec<StoredFailedJob>> {
            let conn = db.get_connection()?;
            query_recent(&conn, Some(&job_class), limit)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl FailedJobStore for SqliteFailedJobRepository {
    #[instrument(skip(self, record), fields(job_class = %record.job_class, job_id = %record.job_id))]
    async fn insert(&self, record: &FailedJobRecord) -> Result<i64> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> Result<i64> {
            let conn = db.get_connection()?;
            insert_record(&conn, &record)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count(&self) -> Result<u64> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM failed_jobs", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            u64::try_from(count)
                .map_err(|_| SyncwardError::Database(format!("negative row count {count}")))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredFailedJob>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<StoredFailedJob>> {
            let conn = db.get_connection()?;
            query_recent(&conn, None, limit)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn prune_to(&self, keep: usize) -> Result<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute(
                    "DELETE FROM failed_jobs WHERE id IN (
                        SELECT id FROM failed_jobs
                        ORDER BY failed_at DESC, id DESC
                        LIMIT -1 OFFSET ?1
                    )",
                    params![to_sql_limit(keep)?],
                )
                .map_err(map_sql_error)?;
            debug!(deleted, keep, "pruned failed_jobs");
            Ok(deleted)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn insert_record(conn: &Connection, record: &FailedJobRecord) -> Result<i64> {
    let arguments = serde_json::to_string(&record.arguments)?;
    conn.execute(
        "INSERT INTO failed_jobs (
            job_class, job_id, arguments, error_kind, error_message,
            backtrace, failed_at, executions
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.job_class,
            record.job_id,
            arguments,
            record.error_kind,
            record.error_message,
            record.backtrace,
            format_timestamp(record.failed_at),
            record.executions,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(conn.last_insert_rowid())
}

fn query_recent(
    conn: &Connection,
    job_class: Option<&str>,
    limit: usize,
) -> Result<Vec<StoredFailedJob>> {
    let limit = to_sql_limit(limit)?;
    let filter = if job_class.is_some() { "WHERE job_class = ?2" } else { "WHERE ?2 IS NULL" };
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM failed_jobs {filter}
         ORDER BY failed_at DESC, id DESC LIMIT ?1"
    );

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![limit, job_class], map_failed_job_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(rows)
}

fn map_failed_job_row(row: &Row<'_>) -> rusqlite::Result<StoredFailedJob> {
    let arguments: String = row.get(3)?;
    let failed_at: String = row.get(7)?;

    Ok(StoredFailedJob {
        id: row.get(0)?,
        record: FailedJobRecord {
            job_class: row.get(1)?,
            job_id: row.get(2)?,
            arguments: serde_json::from_str(&arguments)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
            error_kind: row.get(4)?,
            error_message: row.get(5)?,
            backtrace: row.get(6)?,
            failed_at: DateTime::parse_from_rfc3339(&failed_at)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
            executions: row.get(8)?,
        },
    })
}

/// Fixed-width UTC timestamps so lexical order matches time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_sql_limit(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| SyncwardError::InvalidInput(format!("limit {value} too large")))
}

fn map_join_error(err: task::JoinError) -> SyncwardError {
    if err.is_cancelled() {
        SyncwardError::Internal("blocking task cancelled".into())
    } else {
        SyncwardError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid date");
        let late = early + chrono::Duration::milliseconds(1);
        let (a, b) = (format_timestamp(early), format_timestamp(late));
        assert_eq!(a, "2026-01-02T03:04:05.000000Z");
        assert!(a < b);
    }

    #[test]
    fn oversized_limit_is_rejected() {
        assert!(to_sql_limit(usize::MAX).is_err());
        assert_eq!(to_sql_limit(10).expect("fits"), 10);
    }
}
