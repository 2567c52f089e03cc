//! SQLite pool for the scoring database
//!
//! `storage.database` is either a file path or `:memory:`. A file database is
//! opened in WAL mode with its parent directory created on demand; an
//! in-memory database lives on a single connection that is never recycled,
//! since closing it would drop every table.
//!
//! The baseline schema is applied on every open (`CREATE TABLE IF NOT
//! EXISTS`) and stamped into `PRAGMA user_version`. A database stamped by a
//! newer build is refused instead of being written with the old layout.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::StoreError;

/// Version written to `PRAGMA user_version` by the baseline schema
pub const SCHEMA_VERSION: i64 = 1;

const BASELINE_SCHEMA: &str = include_str!("migrations/20240601_initial.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const FILE_CONNECTIONS: u32 = 5;

/// Where the scoring database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

impl DatabaseLocation {
    /// Maps the configured path; `:memory:` selects an in-memory database.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == ":memory:" {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(path.to_path_buf())
        }
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
            DatabaseLocation::Memory => f.write_str(":memory:"),
        }
    }
}

/// Connection pool with the scoring schema applied
pub struct DatabasePool {
    pool: SqlitePool,
    location: DatabaseLocation,
}

impl DatabasePool {
    /// Opens the database at `db_path` (or in memory for `:memory:`).
    ///
    /// # Errors
    ///
    /// `StoreError::ConnectionFailed` when the file cannot be opened,
    /// `StoreError::MigrationFailed` when the schema cannot be applied or the
    /// file was written by a newer schema.
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        Self::open(DatabaseLocation::from_path(db_path)).await
    }

    /// A fresh, empty in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::open(DatabaseLocation::Memory).await
    }

    pub async fn open(location: DatabaseLocation) -> Result<Self, StoreError> {
        let pool = match &location {
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::ConnectionFailed(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(BUSY_TIMEOUT);
                SqlitePoolOptions::new()
                    .max_connections(FILE_CONNECTIONS)
                    .connect_with(options)
                    .await
            }
            DatabaseLocation::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
                    .busy_timeout(BUSY_TIMEOUT);
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
            }
        }
        .map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to open database {}: {}", location, e))
        })?;

        apply_schema(&pool).await?;
        tracing::info!(database = %location, "Database pool initialized");

        Ok(Self { pool, location })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Schema version stamped in the database.
    pub async fn schema_version(&self) -> Result<i64, StoreError> {
        user_version(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn user_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Failed to read schema version: {}", e)))
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    let found = user_version(pool).await?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::MigrationFailed(format!(
            "database schema version {} is newer than supported version {}",
            found, SCHEMA_VERSION
        )));
    }

    sqlx::raw_sql(BASELINE_SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| {
            StoreError::MigrationFailed(format!("Failed to apply baseline schema: {}", e))
        })?;

    if found < SCHEMA_VERSION {
        // PRAGMA values cannot be bound
        let stamp = format!("PRAGMA user_version = {}", SCHEMA_VERSION);
        sqlx::query(&stamp).execute(pool).await.map_err(|e| {
            StoreError::MigrationFailed(format!("Failed to stamp schema version: {}", e))
        })?;
        tracing::debug!(from = found, to = SCHEMA_VERSION, "Schema version stamped");
    }
    Ok(())
}
