//! Infrastructure layer for Duraflow.
//!
//! Implements the `ExecutionLog` port defined in `duraflow-core` with SQLite
//! persistence: WAL journaling, normal synchronous commits, and split
//! read/write connection pools. Also provides the database location config.

pub mod config;
pub mod sqlite;

pub use config::default_database_url;
pub use sqlite::execution_log::SqliteExecutionLog;
pub use sqlite::pool::DatabasePool;
