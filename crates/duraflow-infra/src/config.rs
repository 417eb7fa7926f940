//! Database location configuration.

/// File name of the execution log database in the working directory. SQLite
/// manages `-wal` and `-shm` sidecars next to it.
pub const DEFAULT_DATABASE_FILE: &str = "execution_log.db";

/// Returns the database URL, honoring the `DURAFLOW_DATABASE_URL` env var
/// and falling back to `execution_log.db` in the process working directory.
/// The file is created on first use.
pub fn default_database_url() -> String {
    std::env::var("DURAFLOW_DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{DEFAULT_DATABASE_FILE}?mode=rwc"))
}
