//! Per-user settings storage.

use sqlx::SqlitePool;

use crate::models::UserSettings;
use crate::Result;

/// Get a user's settings, falling back to defaults when no row exists.
///
/// Settings rows are created lazily by the `set_*` operations; a user who
/// has never touched their settings simply has none stored.
pub async fn get_settings(pool: &SqlitePool, user_id: &str) -> Result<UserSettings> {
    let record = sqlx::query_as::<_, UserSettings>(
        r#"
        SELECT user_id, time_zone, blocked
        FROM user_settings
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record.unwrap_or_else(|| UserSettings::defaults(user_id)))
}

/// Set or clear a user's time zone.
pub async fn set_time_zone(pool: &SqlitePool, user_id: &str, time_zone: Option<&str>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, time_zone)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET time_zone = excluded.time_zone
        "#,
    )
    .bind(user_id)
    .bind(time_zone)
    .execute(pool)
    .await?;

    Ok(())
}

/// Block or unblock a user from nudge consideration.
pub async fn set_blocked(pool: &SqlitePool, user_id: &str, blocked: bool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, blocked)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET blocked = excluded.blocked
        "#,
    )
    .bind(user_id)
    .bind(blocked)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let db = test_db().await;
        let settings = get_settings(db.pool(), "alice").await.unwrap();
        assert_eq!(settings.user_id, "alice");
        assert!(settings.time_zone.is_none());
        assert!(!settings.blocked);
    }

    #[tokio::test]
    async fn test_set_time_zone_then_block() {
        let db = test_db().await;

        set_time_zone(db.pool(), "alice", Some("Europe/Berlin"))
            .await
            .unwrap();
        set_blocked(db.pool(), "alice", true).await.unwrap();

        let settings = get_settings(db.pool(), "alice").await.unwrap();
        assert_eq!(settings.time_zone.as_deref(), Some("Europe/Berlin"));
        assert!(settings.blocked);

        // Blocking must not clobber the zone, and clearing works.
        set_time_zone(db.pool(), "alice", None).await.unwrap();
        let settings = get_settings(db.pool(), "alice").await.unwrap();
        assert!(settings.time_zone.is_none());
        assert!(settings.blocked);
    }
}
