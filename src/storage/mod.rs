//! Storage module for SQLite output
//!
//! This module handles the SQLite rendition of the run's tables:
//! - Schema creation for participant rows, link statuses and runs
//! - Run tracking with the configuration hash and catalog year
//! - The [`SqliteSink`] record sink

mod schema;
mod sqlite;

pub use schema::initialize_schema;
pub use sqlite::SqliteSink;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for crate::output::OutputError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Represents a run recorded in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub year: String,
    pub status: RunStatus,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
