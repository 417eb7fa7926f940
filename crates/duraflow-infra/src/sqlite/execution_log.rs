//! SQLite execution log implementation.
//!
//! Implements `ExecutionLog` from `duraflow-core` using sqlx with split
//! read/write pools. Each operation is a single statement and therefore its
//! own atomic transaction; the start operation is an upsert so a retried
//! step bumps its attempt counter without touching the originally captured
//! parameters.

use chrono::{DateTime, Utc};
use duraflow_core::repository::{ExecutionLog, StartInvocation};
use duraflow_types::{Invocation, InvocationStatus, StoreError};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ExecutionLog`.
pub struct SqliteExecutionLog {
    pool: DatabasePool,
}

impl SqliteExecutionLog {
    /// Create a new execution log backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the log at the given database URL.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = DatabasePool::new(database_url)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

const INVOCATION_COLUMNS: &str = "flow_id, step, timestamp, class_name, method_name, \
                                  delay_millis, status, attempts, parameters, return_value";

struct InvocationRow {
    flow_id: String,
    step: i64,
    timestamp: i64,
    class_name: String,
    method_name: String,
    delay_millis: Option<i64>,
    status: String,
    attempts: i64,
    parameters: Option<Vec<u8>>,
    return_value: Option<Vec<u8>>,
}

impl InvocationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            flow_id: row.try_get("flow_id")?,
            step: row.try_get("step")?,
            timestamp: row.try_get("timestamp")?,
            class_name: row.try_get("class_name")?,
            method_name: row.try_get("method_name")?,
            delay_millis: row.try_get("delay_millis")?,
            status: row.try_get("status")?,
            attempts: row.try_get("attempts")?,
            parameters: row.try_get("parameters")?,
            return_value: row.try_get("return_value")?,
        })
    }

    fn into_invocation(self) -> Result<Invocation, StoreError> {
        let flow_id = self
            .flow_id
            .parse::<Uuid>()
            .map_err(|e| StoreError::Corrupt(format!("invalid flow id: {e}")))?;
        let status = InvocationStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("invalid status: {}", self.status)))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.timestamp)
            .ok_or_else(|| StoreError::Corrupt(format!("invalid timestamp: {}", self.timestamp)))?;

        Ok(Invocation {
            flow_id,
            step: self.step as u32,
            timestamp,
            class_name: self.class_name,
            method_name: self.method_name,
            delay_millis: self.delay_millis,
            status,
            attempts: self.attempts as u32,
            parameters: self.parameters,
            return_value: self.return_value,
        })
    }
}

fn map_invocation(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Invocation>, StoreError> {
    match row {
        Some(row) => {
            let r = InvocationRow::from_row(&row).map_err(|e| StoreError::Io(e.to_string()))?;
            Ok(Some(r.into_invocation()?))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// ExecutionLog impl
// ---------------------------------------------------------------------------

impl ExecutionLog for SqliteExecutionLog {
    async fn log_start(&self, start: StartInvocation<'_>) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO execution_log
                   (flow_id, step, timestamp, class_name, method_name, delay_millis, status, attempts, parameters)
               VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
               ON CONFLICT(flow_id, step) DO UPDATE SET
                 attempts = attempts + 1,
                 status = excluded.status"#,
        )
        .bind(start.flow_id.to_string())
        .bind(start.step as i64)
        .bind(Utc::now().timestamp_millis())
        .bind(start.class_name)
        .bind(start.method_name)
        .bind(start.delay_millis)
        .bind(start.status.as_str())
        .bind(start.parameters)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    async fn log_completion(
        &self,
        flow_id: Uuid,
        step: u32,
        return_value: &[u8],
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE execution_log SET status = 'COMPLETE', return_value = ? \
             WHERE flow_id = ? AND step = ?",
        )
        .bind(return_value)
        .bind(flow_id.to_string())
        .bind(step as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn log_resume_parameters(
        &self,
        flow_id: Uuid,
        step: u32,
        parameters: &[u8],
    ) -> Result<(), StoreError> {
        // First write wins; a repeated delivery leaves the row unchanged.
        let result = sqlx::query(
            "UPDATE execution_log SET parameters = ? \
             WHERE flow_id = ? AND step = ? AND parameters IS NULL",
        )
        .bind(parameters)
        .bind(flow_id.to_string())
        .bind(step as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Distinguish an absent row from one whose parameters are set.
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM execution_log WHERE flow_id = ? AND step = ?")
                    .bind(flow_id.to_string())
                    .bind(step as i64)
                    .fetch_optional(&self.pool.reader)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            if exists.is_none() {
                return Err(StoreError::NotFound);
            }
        }
        Ok(())
    }

    async fn get_invocation(
        &self,
        flow_id: Uuid,
        step: u32,
    ) -> Result<Option<Invocation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INVOCATION_COLUMNS} FROM execution_log WHERE flow_id = ? AND step = ?"
        ))
        .bind(flow_id.to_string())
        .bind(step as i64)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        map_invocation(row)
    }

    async fn get_latest_invocation(
        &self,
        flow_id: Uuid,
    ) -> Result<Option<Invocation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INVOCATION_COLUMNS} FROM execution_log \
             WHERE flow_id = ? ORDER BY step DESC LIMIT 1"
        ))
        .bind(flow_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        map_invocation(row)
    }

    async fn get_incomplete_flows(&self) -> Result<Vec<Invocation>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {INVOCATION_COLUMNS} FROM execution_log \
             WHERE step = 0 AND status != 'COMPLETE' ORDER BY timestamp ASC"
        ))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        let mut flows = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = InvocationRow::from_row(row).map_err(|e| StoreError::Io(e.to_string()))?;
            flows.push(r.into_invocation()?);
        }
        Ok(flows)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM execution_log")
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_log() -> (tempfile::TempDir, SqliteExecutionLog) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("log.db").display());
        let log = SqliteExecutionLog::open(&url).await.unwrap();
        (dir, log)
    }

    fn start(flow_id: Uuid, step: u32) -> StartInvocation<'static> {
        StartInvocation {
            flow_id,
            step,
            class_name: "HelloWorldFlow",
            method_name: "say",
            delay_millis: None,
            status: InvocationStatus::Pending,
            parameters: Some(br#"["World",0]"#.as_slice()),
        }
    }

    #[tokio::test]
    async fn start_inserts_then_bumps_attempts() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        log.log_start(start(id, 1)).await.unwrap();
        let row = log.get_invocation(id, 1).await.unwrap().unwrap();
        assert_eq!(row.attempts, 1);
        assert_eq!(row.status, InvocationStatus::Pending);
        assert_eq!(row.class_name, "HelloWorldFlow");
        assert_eq!(row.parameters.as_deref(), Some(br#"["World",0]"#.as_slice()));
        let first_started = row.timestamp;

        // Retried start: attempts bump, parameters and the first start's
        // timestamp stay as first captured.
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        log.log_start(StartInvocation {
            parameters: Some(br#"["Mars",9]"#.as_slice()),
            ..start(id, 1)
        })
        .await
        .unwrap();
        let row = log.get_invocation(id, 1).await.unwrap().unwrap();
        assert_eq!(row.attempts, 2);
        assert_eq!(row.parameters.as_deref(), Some(br#"["World",0]"#.as_slice()));
        assert_eq!(row.timestamp, first_started);
    }

    #[tokio::test]
    async fn completion_records_status_and_return_value() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        log.log_start(start(id, 1)).await.unwrap();
        log.log_completion(id, 1, b"0").await.unwrap();

        let row = log.get_invocation(id, 1).await.unwrap().unwrap();
        assert_eq!(row.status, InvocationStatus::Complete);
        assert_eq!(row.return_value.as_deref(), Some(b"0".as_slice()));
    }

    #[tokio::test]
    async fn completion_of_a_missing_row_fails() {
        let (_dir, log) = temp_log().await;
        let err = log
            .log_completion(Uuid::new_v4(), 0, b"null")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn resume_parameters_are_written_once() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        log.log_start(StartInvocation {
            status: InvocationStatus::WaitingForSignal,
            parameters: None,
            ..start(id, 3)
        })
        .await
        .unwrap();

        log.log_resume_parameters(id, 3, b"[1700000000]").await.unwrap();
        let row = log.get_invocation(id, 3).await.unwrap().unwrap();
        assert_eq!(row.parameters.as_deref(), Some(b"[1700000000]".as_slice()));

        // A second delivery does not overwrite.
        log.log_resume_parameters(id, 3, b"[99]").await.unwrap();
        let row = log.get_invocation(id, 3).await.unwrap().unwrap();
        assert_eq!(row.parameters.as_deref(), Some(b"[1700000000]".as_slice()));

        let err = log
            .log_resume_parameters(Uuid::new_v4(), 0, b"[]")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn latest_invocation_has_the_highest_step() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        for step in 0..4 {
            log.log_start(start(id, step)).await.unwrap();
        }
        let latest = log.get_latest_invocation(id).await.unwrap().unwrap();
        assert_eq!(latest.step, 3);

        assert!(log.get_latest_invocation(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn incomplete_flows_are_flow_rows_oldest_first() {
        let (_dir, log) = temp_log().await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let done = Uuid::new_v4();

        log.log_start(start(first, 0)).await.unwrap();
        // A non-flow row never shows up, complete or not.
        log.log_start(start(first, 1)).await.unwrap();
        log.log_start(start(second, 0)).await.unwrap();
        log.log_start(start(done, 0)).await.unwrap();
        log.log_completion(done, 0, b"null").await.unwrap();

        let incomplete = log.get_incomplete_flows().await.unwrap();
        let ids: Vec<Uuid> = incomplete.iter().map(|inv| inv.flow_id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(incomplete.iter().all(|inv| inv.is_flow()));
    }

    #[tokio::test]
    async fn reset_drops_all_rows() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        log.log_start(start(id, 0)).await.unwrap();
        log.reset().await.unwrap();
        assert!(log.get_invocation(id, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delay_and_timestamp_round_trip() {
        let (_dir, log) = temp_log().await;
        let id = Uuid::new_v4();

        let before = Utc::now().timestamp_millis();
        log.log_start(StartInvocation {
            delay_millis: Some(1_000),
            ..start(id, 1)
        })
        .await
        .unwrap();
        let after = Utc::now().timestamp_millis();

        let row = log.get_invocation(id, 1).await.unwrap().unwrap();
        assert_eq!(row.delay_millis, Some(1_000));
        let ts = row.timestamp.timestamp_millis();
        assert!(ts >= before && ts <= after);
    }
}
