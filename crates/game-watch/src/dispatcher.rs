//! The nudge dispatch pass.

use chrono::{DateTime, Duration, Utc};
use database::{conversation, session, Database, NudgeCandidate};
use nudge_core::{phrase, resolve_time_zone, SessionTiming};
use tracing::{debug, error, info};

use crate::error::WatchError;
use crate::generator::MessageGenerator;
use crate::notifier::Notifier;
use crate::prompt;

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Candidate sessions examined.
    pub considered: usize,
    /// Nudges generated, delivered, and recorded.
    pub nudged: usize,
    /// Candidates that failed somewhere along the pipeline.
    pub failed: usize,
}

/// Drives one nudge pass over every open, unmuted, unblocked session.
///
/// For each candidate the dispatcher computes the nudge schedule, and when
/// the session is due it generates a message, delivers it, records the nudge,
/// and appends the exchange to the player's conversation. Failures are per
/// player: one broken candidate never blocks the rest of the pass.
pub struct NudgeDispatcher<G, N> {
    db: Database,
    generator: G,
    notifier: N,
    game: String,
}

impl<G: MessageGenerator, N: Notifier> NudgeDispatcher<G, N> {
    /// Create a dispatcher for the given game.
    pub fn new(db: Database, generator: G, notifier: N, game: impl Into<String>) -> Self {
        Self {
            db,
            generator,
            notifier,
            game: game.into(),
        }
    }

    /// The notifier this dispatcher delivers through.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one dispatch pass at `now`.
    ///
    /// The candidate set is snapshotted once at the start of the pass, so a
    /// session closed mid-pass may still receive its final nudge.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<DispatchOutcome, WatchError> {
        let candidates = session::list_nudgeable_sessions(self.db.pool()).await?;
        let mut outcome = DispatchOutcome {
            considered: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            let user_id = candidate.user_id.clone();
            match self.nudge_if_due(candidate, now).await {
                Ok(true) => outcome.nudged += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failed += 1;
                    error!("Failed to nudge {}: {}", user_id, e);
                }
            }
        }

        if outcome.nudged > 0 || outcome.failed > 0 {
            info!(
                considered = outcome.considered,
                nudged = outcome.nudged,
                failed = outcome.failed,
                "Dispatch pass complete"
            );
        }

        Ok(outcome)
    }

    /// Nudge a single candidate if its schedule says it is due. Returns
    /// whether a nudge went out.
    async fn nudge_if_due(
        &self,
        candidate: NudgeCandidate,
        now: DateTime<Utc>,
    ) -> Result<bool, WatchError> {
        let zone_configured = candidate.time_zone.is_some();
        let time_zone = resolve_time_zone(candidate.time_zone.as_deref());

        let timing = SessionTiming {
            started_at: candidate.started_at,
            duration_interval: Duration::minutes(candidate.duration_nudge_minutes),
            lateness_interval: Duration::minutes(candidate.lateness_nudge_minutes),
            latest_nudge_at: candidate.latest_nudge_at,
            time_zone,
        };
        let schedule = timing.schedule()?;

        if !schedule.is_due(now) {
            debug!(
                "{} not due until {}",
                candidate.user_id, schedule.next_due
            );
            return Ok(false);
        }

        let nudge_prompt = phrase::nudge_prompt(
            &self.game,
            now,
            candidate.started_at,
            schedule.lateness_threshold,
            time_zone,
            zone_configured,
        );
        let user_context = prompt::user_context(&candidate.user_id, &self.game);
        let instructions = prompt::instructions(&self.game, &user_context);

        let mut conversation =
            conversation::get_conversation(self.db.pool(), &candidate.user_id, now).await?;

        let reply = self
            .generator
            .generate(&instructions, &conversation.messages, &nudge_prompt)
            .await?;

        self.notifier
            .send_direct_message(&candidate.user_id, &reply)
            .await?;

        // Recorded only after delivery: a failed send retries next pass
        // rather than silently consuming the nudge slot.
        session::record_nudge(self.db.pool(), &candidate.user_id, now).await?;

        conversation.push_user(&nudge_prompt);
        conversation.push_assistant(&reply);
        conversation::save_conversation(self.db.pool(), &conversation, now).await?;

        info!("Nudged {}: {}", candidate.user_id, reply);
        Ok(true)
    }
}
