//! Watch loop error types.

use thiserror::Error;

/// Errors that can occur while reconciling presence or dispatching nudges.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The store was unavailable or a query failed. Aborts the current
    /// cycle; the next tick retries.
    #[error("store error: {0}")]
    Store(#[from] database::DatabaseError),

    /// A session's timing configuration was unusable.
    #[error("timing error: {0}")]
    Timing(#[from] nudge_core::NudgeError),

    /// The presence feed could not produce a snapshot.
    #[error("presence feed error: {0}")]
    FeedFailed(String),

    /// Message generation failed for one user. Isolated per user; the nudge
    /// is retried on the next tick.
    #[error("message generation failed: {0}")]
    GenerationFailed(String),

    /// Delivery failed for one user. Isolated per user; the nudge is
    /// retried on the next tick.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}
