//! Shared setup for the end-to-end flow tests: a fresh engine over a
//! temporary database per test, plus a polling helper for async flows.
#![allow(dead_code)]

use std::time::Duration;

use duraflow_core::Engine;
use duraflow_infra::{DatabasePool, SqliteExecutionLog};
use tempfile::TempDir;

/// A fresh engine backed by an execution log in a temp directory. Keep the
/// `TempDir` alive for the duration of the test.
pub async fn test_engine() -> (TempDir, Engine<SqliteExecutionLog>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("execution_log.db").display()
    );
    let pool = DatabasePool::new(&url).await.unwrap();
    (dir, Engine::new(SqliteExecutionLog::new(pool)))
}

/// Poll `probe` until it reports true, failing the test after 3 seconds.
pub async fn eventually<F, Fut>(mut probe: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if probe().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
}
