//! Database Module
//!
//! SQLite pool construction and embedded migrations. Repositories live
//! in [`repository`] and operate on the pool handle directly.

pub mod repository;

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::utils::AppError;

/// Open (or create) the SQLite database at `path` and bring the schema
/// up to date.
///
/// WAL keeps dashboard reads unblocked during job writes; busy_timeout
/// makes concurrent writers queue for up to 5s instead of erroring.
pub async fn connect(path: &Path) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("foreign_keys", "ON")
        .optimize_on_close(true, None);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;

    tracing::info!(db = %path.display(), "Database ready (WAL, busy_timeout=5000ms)");

    Ok(pool)
}
