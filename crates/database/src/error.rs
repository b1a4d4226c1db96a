//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Rejected before persistence: the value would make a session unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Stored data that can no longer be decoded (e.g. corrupt history JSON).
    #[error("corrupt record for {entity} {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
