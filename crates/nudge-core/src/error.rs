//! Timing engine error types.

use thiserror::Error;

/// Errors that can occur when computing a nudge schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NudgeError {
    /// A nudge interval that is zero or negative. These are rejected rather
    /// than looped: the schedule arithmetic divides by the interval.
    #[error("invalid {kind} nudge interval: {minutes} minutes (must be positive)")]
    InvalidInterval {
        /// "duration" or "lateness".
        kind: &'static str,
        /// The offending interval length.
        minutes: i64,
    },
}
