pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Corrupted row in {table}: {reason}")]
    Corrupted { table: String, reason: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal lock error")]
    LockPoisoned,
}
