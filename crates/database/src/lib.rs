//! SQLite persistence layer for Winddown.
//!
//! This crate provides async database operations for game sessions, per-user
//! settings, and conversation state using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use database::{session, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:winddown.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // A player was observed starting to play
//!     session::start_session(db.pool(), "user-123", None, Utc::now()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod models;
pub mod session;
pub mod settings;

pub use conversation::CONVERSATION_TTL_MINUTES;
pub use error::{DatabaseError, Result};
pub use models::{
    Conversation, GameSession, HistoryMessage, NudgeCandidate, UserSettings,
};
pub use session::{SyncOutcome, SESSION_RETENTION_MINUTES};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// The sync loop, dispatch loop, and live presence hook share the pool.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for testing.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();

        session::start_session(db.pool(), "alice", Some(t0), t0)
            .await
            .unwrap();
        let open = session::get_session(db.pool(), "alice").await.unwrap();
        assert!(open.unwrap().ended_at.is_none());

        session::stop_session(db.pool(), "alice", t0 + chrono::Duration::hours(1))
            .await
            .unwrap();
        let closed = session::get_session(db.pool(), "alice").await.unwrap();
        assert!(closed.unwrap().ended_at.is_some());

        db.close().await;
    }
}
