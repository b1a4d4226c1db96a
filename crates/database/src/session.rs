//! Game session CRUD and reconciliation operations.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{DatabaseError, Result};
use crate::models::{GameSession, NudgeCandidate};

/// How long a closed session is kept before it is reaped.
pub const SESSION_RETENTION_MINUTES: i64 = 5;

/// Outcome of one presence sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Sessions upserted from the snapshot.
    pub observed: usize,
    /// Open sessions closed because their player left the snapshot.
    pub closed: u64,
    /// Closed sessions deleted past the retention window.
    pub reaped: u64,
}

/// Open a session for a player, or refresh one that is already open.
///
/// Idempotent: if an open session exists, its `started_at` and nudge state
/// are left untouched and only a stale `ended_at` is cleared. When the
/// platform did not report an activity start, `now` is used.
pub async fn start_session(
    pool: &SqlitePool,
    user_id: &str,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO game_sessions (user_id, started_at)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET ended_at = NULL
        "#,
    )
    .bind(user_id)
    .bind(started_at.unwrap_or(now))
    .execute(pool)
    .await?;

    Ok(())
}

/// Close a player's open session, if any.
///
/// Idempotent: closing an already-closed or missing session is a no-op.
pub async fn stop_session(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE game_sessions
        SET ended_at = ?
        WHERE user_id = ? AND ended_at IS NULL
        "#,
    )
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Reconcile the full presence snapshot against stored sessions.
///
/// Applied as a single transaction so an interrupted sync never leaves a
/// half-applied reconciliation: every observed player is upserted, every
/// open session missing from the snapshot is closed at `now`, and closed
/// sessions past the retention window are deleted.
pub async fn sync_sessions(
    pool: &SqlitePool,
    players: &[(String, Option<DateTime<Utc>>)],
    now: DateTime<Utc>,
) -> Result<SyncOutcome> {
    let mut tx = pool.begin().await?;

    for (user_id, started_at) in players {
        sqlx::query(
            r#"
            INSERT INTO game_sessions (user_id, started_at)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET ended_at = NULL
            "#,
        )
        .bind(user_id)
        .bind(started_at.unwrap_or(now))
        .execute(&mut *tx)
        .await?;
    }

    let closed = close_absent_sessions(&mut tx, players, now).await?;
    let reaped = reap_in_tx(&mut tx, now).await?;

    tx.commit().await?;

    Ok(SyncOutcome {
        observed: players.len(),
        closed,
        reaped,
    })
}

/// Close every open session whose player is not in the snapshot.
async fn close_absent_sessions(
    tx: &mut Transaction<'_, Sqlite>,
    players: &[(String, Option<DateTime<Utc>>)],
    now: DateTime<Utc>,
) -> Result<u64> {
    // SQLite rejects an empty IN list, so an empty snapshot closes everything.
    let result = if players.is_empty() {
        sqlx::query(
            r#"
            UPDATE game_sessions
            SET ended_at = ?
            WHERE ended_at IS NULL
            "#,
        )
        .bind(now)
        .execute(&mut **tx)
        .await?
    } else {
        let placeholders = vec!["?"; players.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE game_sessions
            SET ended_at = ?
            WHERE ended_at IS NULL AND user_id NOT IN ({placeholders})
            "#
        );
        let mut query = sqlx::query(&sql).bind(now);
        for (user_id, _) in players {
            query = query.bind(user_id);
        }
        query.execute(&mut **tx).await?
    };

    Ok(result.rows_affected())
}

/// Delete closed sessions past the retention window.
pub async fn reap_sessions(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - Duration::minutes(SESSION_RETENTION_MINUTES);
    let result = sqlx::query(
        r#"
        DELETE FROM game_sessions
        WHERE ended_at IS NOT NULL AND ended_at < ?
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

async fn reap_in_tx(tx: &mut Transaction<'_, Sqlite>, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - Duration::minutes(SESSION_RETENTION_MINUTES);
    let result = sqlx::query(
        r#"
        DELETE FROM game_sessions
        WHERE ended_at IS NOT NULL AND ended_at < ?
        "#,
    )
    .bind(cutoff)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Get a player's session row, if one exists.
pub async fn get_session(pool: &SqlitePool, user_id: &str) -> Result<Option<GameSession>> {
    let record = sqlx::query_as::<_, GameSession>(
        r#"
        SELECT user_id, started_at, ended_at, muted,
               duration_nudge_minutes, lateness_nudge_minutes, latest_nudge_at
        FROM game_sessions
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List every session the dispatcher should consider: open, unmuted, and
/// whose owner is not blocked, joined with the owner's settings.
pub async fn list_nudgeable_sessions(pool: &SqlitePool) -> Result<Vec<NudgeCandidate>> {
    let candidates = sqlx::query_as::<_, NudgeCandidate>(
        r#"
        SELECT gs.user_id, gs.started_at,
               gs.duration_nudge_minutes, gs.lateness_nudge_minutes,
               gs.latest_nudge_at, us.time_zone
        FROM game_sessions gs
        LEFT JOIN user_settings us ON gs.user_id = us.user_id
        WHERE gs.ended_at IS NULL
          AND gs.muted = 0
          AND (us.blocked IS NULL OR us.blocked = 0)
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(candidates)
}

/// Record that a nudge was sent for a player's session.
pub async fn record_nudge(pool: &SqlitePool, user_id: &str, at: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE game_sessions
        SET latest_nudge_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(at)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "GameSession",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// Mute or unmute a player's session.
pub async fn set_muted(pool: &SqlitePool, user_id: &str, muted: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE game_sessions
        SET muted = ?
        WHERE user_id = ?
        "#,
    )
    .bind(muted)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "GameSession",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// Change a session's nudge intervals.
///
/// Non-positive intervals would make the timing engine loop forever, so
/// they are rejected here, before anything is persisted.
pub async fn set_nudge_intervals(
    pool: &SqlitePool,
    user_id: &str,
    duration_minutes: i64,
    lateness_minutes: i64,
) -> Result<()> {
    if duration_minutes <= 0 || lateness_minutes <= 0 {
        return Err(DatabaseError::InvalidConfiguration(format!(
            "nudge intervals must be positive (got duration={duration_minutes}, lateness={lateness_minutes})"
        )));
    }

    let result = sqlx::query(
        r#"
        UPDATE game_sessions
        SET duration_nudge_minutes = ?, lateness_nudge_minutes = ?
        WHERE user_id = ?
        "#,
    )
    .bind(duration_minutes)
    .bind(lateness_minutes)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "GameSession",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::TimeZone;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_start_session_defaults() {
        let db = test_db().await;
        let now = at(20, 0);

        start_session(db.pool(), "alice", Some(at(19, 30)), now)
            .await
            .unwrap();

        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.started_at, at(19, 30));
        assert!(session.ended_at.is_none());
        assert!(!session.muted);
        assert_eq!(session.duration_nudge_minutes, 60);
        assert_eq!(session.lateness_nudge_minutes, 30);
        assert!(session.latest_nudge_at.is_none());
    }

    #[tokio::test]
    async fn test_start_session_without_activity_start_uses_now() {
        let db = test_db().await;
        let now = at(20, 0);

        start_session(db.pool(), "alice", None, now).await.unwrap();

        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.started_at, now);
    }

    #[tokio::test]
    async fn test_start_session_idempotent() {
        let db = test_db().await;

        start_session(db.pool(), "alice", Some(at(19, 0)), at(19, 0))
            .await
            .unwrap();
        record_nudge(db.pool(), "alice", at(20, 0)).await.unwrap();

        // A repeated observation must not disturb timing fields.
        start_session(db.pool(), "alice", Some(at(19, 45)), at(20, 30))
            .await
            .unwrap();

        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.started_at, at(19, 0));
        assert_eq!(session.latest_nudge_at, Some(at(20, 0)));
    }

    #[tokio::test]
    async fn test_start_session_reopens_closed_session() {
        let db = test_db().await;

        start_session(db.pool(), "alice", Some(at(19, 0)), at(19, 0))
            .await
            .unwrap();
        stop_session(db.pool(), "alice", at(20, 0)).await.unwrap();

        start_session(db.pool(), "alice", Some(at(20, 1)), at(20, 1))
            .await
            .unwrap();

        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert!(session.ended_at.is_none());
    }

    #[tokio::test]
    async fn test_stop_session_idempotent() {
        let db = test_db().await;

        start_session(db.pool(), "alice", Some(at(19, 0)), at(19, 0))
            .await
            .unwrap();
        stop_session(db.pool(), "alice", at(20, 0)).await.unwrap();
        stop_session(db.pool(), "alice", at(20, 5)).await.unwrap();

        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.ended_at, Some(at(20, 0)));

        // Stopping a player with no session at all is fine too.
        stop_session(db.pool(), "nobody", at(20, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_closes_absent_and_keeps_present() {
        let db = test_db().await;
        let now = at(21, 0);

        start_session(db.pool(), "alice", Some(at(19, 0)), now)
            .await
            .unwrap();
        start_session(db.pool(), "bob", Some(at(19, 30)), now)
            .await
            .unwrap();

        let snapshot = vec![("alice".to_string(), Some(at(19, 0)))];
        let outcome = sync_sessions(db.pool(), &snapshot, now).await.unwrap();

        assert_eq!(outcome.observed, 1);
        assert_eq!(outcome.closed, 1);

        let alice = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert!(alice.ended_at.is_none());
        let bob = get_session(db.pool(), "bob").await.unwrap().unwrap();
        assert_eq!(bob.ended_at, Some(now));
    }

    #[tokio::test]
    async fn test_sync_empty_snapshot_closes_everything() {
        let db = test_db().await;
        let now = at(21, 0);

        start_session(db.pool(), "alice", Some(at(19, 0)), now)
            .await
            .unwrap();

        let outcome = sync_sessions(db.pool(), &[], now).await.unwrap();
        assert_eq!(outcome.closed, 1);
    }

    #[tokio::test]
    async fn test_reap_boundary() {
        let db = test_db().await;
        let now = at(21, 0);

        start_session(db.pool(), "stale", Some(at(19, 0)), now)
            .await
            .unwrap();
        stop_session(db.pool(), "stale", now - Duration::minutes(6))
            .await
            .unwrap();

        start_session(db.pool(), "fresh", Some(at(19, 0)), now)
            .await
            .unwrap();
        stop_session(db.pool(), "fresh", now - Duration::minutes(4))
            .await
            .unwrap();

        let reaped = reap_sessions(db.pool(), now).await.unwrap();
        assert_eq!(reaped, 1);

        assert!(get_session(db.pool(), "stale").await.unwrap().is_none());
        assert!(get_session(db.pool(), "fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_nudgeable_filters_muted_blocked_and_closed() {
        let db = test_db().await;
        let now = at(20, 0);

        for user in ["open", "muted", "blocked", "closed"] {
            start_session(db.pool(), user, Some(at(19, 0)), now)
                .await
                .unwrap();
        }
        set_muted(db.pool(), "muted", true).await.unwrap();
        crate::settings::set_blocked(db.pool(), "blocked", true)
            .await
            .unwrap();
        stop_session(db.pool(), "closed", now).await.unwrap();

        let candidates = list_nudgeable_sessions(db.pool()).await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.user_id.as_str()).collect();
        assert_eq!(ids, vec!["open"]);
        assert!(candidates[0].time_zone.is_none());
    }

    #[tokio::test]
    async fn test_nudgeable_carries_time_zone() {
        let db = test_db().await;
        let now = at(20, 0);

        start_session(db.pool(), "alice", Some(at(19, 0)), now)
            .await
            .unwrap();
        crate::settings::set_time_zone(db.pool(), "alice", Some("America/New_York"))
            .await
            .unwrap();

        let candidates = list_nudgeable_sessions(db.pool()).await.unwrap();
        assert_eq!(
            candidates[0].time_zone.as_deref(),
            Some("America/New_York")
        );
    }

    #[tokio::test]
    async fn test_set_nudge_intervals_rejects_non_positive() {
        let db = test_db().await;
        start_session(db.pool(), "alice", Some(at(19, 0)), at(19, 0))
            .await
            .unwrap();

        let err = set_nudge_intervals(db.pool(), "alice", 0, 30)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConfiguration(_)));

        let err = set_nudge_intervals(db.pool(), "alice", 60, -5)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConfiguration(_)));

        // Nothing was persisted.
        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.duration_nudge_minutes, 60);
        assert_eq!(session.lateness_nudge_minutes, 30);

        set_nudge_intervals(db.pool(), "alice", 45, 20).await.unwrap();
        let session = get_session(db.pool(), "alice").await.unwrap().unwrap();
        assert_eq!(session.duration_nudge_minutes, 45);
        assert_eq!(session.lateness_nudge_minutes, 20);
    }

    #[tokio::test]
    async fn test_record_nudge_missing_session() {
        let db = test_db().await;
        let err = record_nudge(db.pool(), "ghost", at(20, 0)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
