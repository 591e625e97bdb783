//! Storage Layer
//!
//! Append-only SQLite table of soil test records, accessed through a
//! repository over a `sqlx` connection pool.

mod repository;

pub use repository::{BatchSize, NewSoilRecord, SoilRecord, SoilRepository};

use data_validator::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database could not be reached
    #[error("Error connecting to database: {0}")]
    Connection(String),
    /// Table creation failed
    #[error("Error creating table: {0}")]
    Schema(String),
    /// Record rejected before any write
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Statement failed
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Connection(err.to_string())
            }
            other => StorageError::Database(other.to_string()),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL, e.g. `sqlite://soil_health.db` or `sqlite::memory:`
    pub database_url: String,
    /// Pool size (forced to 1 for in-memory databases)
    pub max_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,
    /// Default rows per transaction for batch inserts
    pub batch_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://soil_health.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
            batch_size: BatchSize::MAX,
        }
    }
}

impl StorageConfig {
    /// Config for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}
