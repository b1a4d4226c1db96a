//! Nudge timing engine for Winddown.
//!
//! Pure computation over a play-session snapshot: given when a session
//! started, the player's time zone, and when the last nudge went out, this
//! crate answers "when is the next nudge due?". Two schedules compete — a
//! duration schedule pacing off the session start and a lateness schedule
//! pacing off 11 PM local — and [`SessionTiming::schedule`] reconciles them
//! into a single instant.
//!
//! No I/O happens here; callers feed in snapshots and the current time.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use nudge_core::{SessionTiming, DEFAULT_TIME_ZONE};
//!
//! let timing = SessionTiming {
//!     started_at: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
//!     duration_interval: Duration::minutes(60),
//!     lateness_interval: Duration::minutes(30),
//!     latest_nudge_at: None,
//!     time_zone: DEFAULT_TIME_ZONE,
//! };
//! let schedule = timing.schedule()?;
//! assert!(schedule.next_due > timing.started_at);
//! # Ok::<(), nudge_core::NudgeError>(())
//! ```

mod error;
pub mod phrase;
mod schedule;

pub use error::NudgeError;
pub use schedule::{
    reconcile, NudgeSchedule, SessionTiming, RECONCILE_WINDOW_MINUTES,
};

use chrono_tz::Tz;

/// Fallback zone for players who never set one.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Europe::London;

/// Resolve a stored IANA zone name, falling back to [`DEFAULT_TIME_ZONE`]
/// when absent or unparseable.
pub fn resolve_time_zone(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse().ok()).unwrap_or(DEFAULT_TIME_ZONE)
}
