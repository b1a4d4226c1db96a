//! Next-nudge-due computation.
//!
//! Two independent schedules produce candidate instants for a session:
//!
//! - the *duration* schedule fires every `duration_interval` from the
//!   session start;
//! - the *lateness* schedule fires once local wall-clock time passes the
//!   lateness threshold (11 PM on the session's start day), then every
//!   `lateness_interval` after that.
//!
//! [`SessionTiming::schedule`] reconciles the two into one next-due instant.
//! Everything here is pure arithmetic over a session snapshot; deciding
//! whether a session is actually due (`next_due < now`) is the caller's job.

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::NudgeError;

/// If the duration and lateness candidates land within this many minutes of
/// each other, they collapse into a single (later) nudge instead of firing
/// twice in quick succession. The window is inclusive.
pub const RECONCILE_WINDOW_MINUTES: i64 = 15;

/// The wall-clock anchor the lateness threshold is derived from.
const LATENESS_ANCHOR_HOUR: i64 = 6;

/// Offset subtracted from the anchor, yielding 11 PM the previous evening.
const LATENESS_OFFSET_HOURS: i64 = 7;

/// Timing snapshot of one session, with the owner's resolved time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTiming {
    /// When the session began (UTC).
    pub started_at: DateTime<Utc>,
    /// Gap between duration nudges.
    pub duration_interval: Duration,
    /// Gap between lateness nudges.
    pub lateness_interval: Duration,
    /// Last time a nudge of either kind was sent, if any.
    pub latest_nudge_at: Option<DateTime<Utc>>,
    /// The player's time zone.
    pub time_zone: Tz,
}

/// The computed nudge schedule for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeSchedule {
    /// Instant after which lateness framing applies.
    pub lateness_threshold: DateTime<Utc>,
    /// Next instant the duration schedule would fire.
    pub next_duration_due: DateTime<Utc>,
    /// Next instant the lateness schedule would fire.
    pub next_lateness_due: DateTime<Utc>,
    /// The single reconciled next-due instant.
    pub next_due: DateTime<Utc>,
}

impl NudgeSchedule {
    /// Whether the session is due a nudge at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due < now
    }
}

impl SessionTiming {
    /// Compute the full nudge schedule for this session.
    pub fn schedule(&self) -> Result<NudgeSchedule, NudgeError> {
        let next_duration_due = self.next_duration_due()?;
        let lateness_threshold = self.lateness_threshold();
        let next_lateness_due = self.next_lateness_due(lateness_threshold)?;

        Ok(NudgeSchedule {
            lateness_threshold,
            next_duration_due,
            next_lateness_due,
            next_due: reconcile(next_duration_due, next_lateness_due),
        })
    }

    /// Next instant the duration schedule fires: the smallest
    /// `started_at + k * duration_interval` (integer k >= 1) strictly after
    /// the latest nudge (or after `started_at` if none was ever sent).
    pub fn next_duration_due(&self) -> Result<DateTime<Utc>, NudgeError> {
        let interval = checked_interval("duration", self.duration_interval)?;
        let baseline = self
            .latest_nudge_at
            .map_or(self.started_at, |latest| latest.max(self.started_at));

        Ok(next_occurrence(self.started_at, interval, Some(baseline)))
    }

    /// Next instant the lateness schedule fires: the threshold itself if no
    /// nudge was ever sent, otherwise the smallest
    /// `threshold + k * lateness_interval` (k >= 0) strictly after the
    /// latest nudge.
    pub fn next_lateness_due(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, NudgeError> {
        let interval = checked_interval("lateness", self.lateness_interval)?;
        Ok(next_occurrence(threshold, interval, self.latest_nudge_at))
    }

    /// The instant after which "it's getting late" framing applies.
    ///
    /// Anchored at 6 AM local on the session's start day, rolled forward one
    /// calendar day when the session started after 6 AM, then pulled back
    /// seven hours. The net effect is 11 PM local on the start day, with
    /// sessions starting between midnight and 6 AM attaching to the previous
    /// evening's 11 PM.
    pub fn lateness_threshold(&self) -> DateTime<Utc> {
        let local_started = self.started_at.with_timezone(&self.time_zone);
        let local_naive = local_started.naive_local();

        let mut anchor = local_naive.date().and_time(NaiveTime::MIN)
            + Duration::hours(LATENESS_ANCHOR_HOUR);
        if anchor < local_naive {
            anchor += Duration::days(1);
        }
        let threshold = anchor - Duration::hours(LATENESS_OFFSET_HOURS);

        resolve_local(self.time_zone, threshold)
    }
}

/// Reconcile the two candidate instants into one decision: candidates within
/// the overlap window collapse into the later one, otherwise whichever fires
/// first wins.
pub fn reconcile(duration_due: DateTime<Utc>, lateness_due: DateTime<Utc>) -> DateTime<Utc> {
    let gap = (duration_due - lateness_due).abs();
    if gap <= Duration::minutes(RECONCILE_WINDOW_MINUTES) {
        duration_due.max(lateness_due)
    } else {
        duration_due.min(lateness_due)
    }
}

fn checked_interval(kind: &'static str, interval: Duration) -> Result<Duration, NudgeError> {
    if interval <= Duration::zero() {
        return Err(NudgeError::InvalidInterval {
            kind,
            minutes: interval.num_minutes(),
        });
    }
    Ok(interval)
}

/// The earliest `anchor + k * interval` (integer k >= 0) strictly after
/// `after`; `anchor` itself when `after` is absent or earlier than the
/// anchor. Closed form so a very old session costs the same as a fresh one.
fn next_occurrence(
    anchor: DateTime<Utc>,
    interval: Duration,
    after: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match after {
        None => anchor,
        Some(after) if after < anchor => anchor,
        Some(after) => {
            let step = interval.num_milliseconds();
            let elapsed = (after - anchor).num_milliseconds();
            let k = elapsed / step + 1;
            anchor + Duration::milliseconds(step * k)
        }
    }
}

/// Resolve a local wall-clock time to a UTC instant. Ambiguous times (DST
/// fall-back) take the earlier instant; nonexistent times (DST spring-forward
/// gap) land just after the jump.
fn resolve_local(tz: Tz, naive: chrono::NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
