//! Riftscore Store - persistence adapters
//!
//! - SQLite repository for players, per-match metrics and power levels
//! - Filesystem storage for bulk segments of raw match documents
//!
//! ## Architecture
//!
//! This crate implements the `IPowerLevelRepository` and `IBulkStorage`
//! ports from `riftscore-core`. Both are driven (secondary) adapters in the
//! hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool that applies the baseline schema
//! - [`SqlitePowerLevelRepository`] - `IPowerLevelRepository` implementation
//! - [`FsBulkStorage`] - `IBulkStorage` implementation rooted at a directory
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use riftscore_store::{DatabasePool, SqlitePowerLevelRepository};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/riftscore/riftscore.db")).await?;
//! let repo = SqlitePowerLevelRepository::new(pool.pool().clone());
//! // Use repo as IPowerLevelRepository...
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod bulk;
pub mod pool;
pub mod repository;

pub use bulk::FsBulkStorage;
pub use pool::{DatabaseLocation, DatabasePool};
pub use repository::SqlitePowerLevelRepository;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Applying the schema failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A bulk key that does not map to a path under the storage root
    #[error("Invalid segment key '{0}'")]
    InvalidKey(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}
