//! Presence reconciliation against the session store.

use chrono::{DateTime, Utc};
use database::{conversation, session, Database, SyncOutcome};
use tracing::{debug, info};

use crate::error::WatchError;
use crate::feed::{dedup_players, PlayerActivity};

/// Reconciles observed presence with stored game sessions.
///
/// Two entry points share the same idempotent store semantics: the batch
/// [`sync`](PresenceReconciler::sync) applied on a timer, and the per-event
/// [`track_player`](PresenceReconciler::track_player) /
/// [`untrack_player`](PresenceReconciler::untrack_player) hooks driven by
/// live presence transitions. They may race on the same user; last write
/// wins either way.
#[derive(Clone)]
pub struct PresenceReconciler {
    db: Database,
}

impl PresenceReconciler {
    /// Create a reconciler over the given store.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Reconcile a full presence snapshot: open-or-refresh every observed
    /// player, close sessions for everyone missing from the snapshot, and
    /// reap sessions closed beyond the retention window. Applied as one
    /// store transaction. Stale conversations ride along on the same cadence.
    pub async fn sync(
        &self,
        players: Vec<PlayerActivity>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, WatchError> {
        let snapshot = dedup_players(players);
        debug!("Syncing {} active players", snapshot.len());

        let outcome = session::sync_sessions(self.db.pool(), &snapshot, now).await?;
        let pruned = conversation::prune_stale_conversations(self.db.pool(), now).await?;

        info!(
            observed = outcome.observed,
            closed = outcome.closed,
            reaped = outcome.reaped,
            pruned_conversations = pruned,
            "Presence sync complete"
        );

        Ok(outcome)
    }

    /// A player was observed starting to play. Safe to call redundantly: an
    /// already-open session keeps its `started_at` and nudge state.
    pub async fn track_player(
        &self,
        user_id: &str,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), WatchError> {
        info!("{} is now playing", user_id);
        session::start_session(self.db.pool(), user_id, started_at, now).await?;
        Ok(())
    }

    /// A player was observed stopping. Safe to call redundantly.
    pub async fn untrack_player(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), WatchError> {
        info!("{} has stopped playing", user_id);
        session::stop_session(self.db.pool(), user_id, now).await?;
        Ok(())
    }
}
