//! Conversation history persistence.
//!
//! Conversations are ephemeral: a history that has seen no message for two
//! hours is treated as expired on read and deleted by the pruning pass.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, HistoryMessage};

/// How long a conversation survives after its last message.
pub const CONVERSATION_TTL_MINUTES: i64 = 120;

/// Get a user's conversation, if it is still fresh.
///
/// A missing or expired conversation comes back empty rather than as an
/// error; callers always have something to append to.
pub async fn get_conversation(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Conversation> {
    let cutoff = now - Duration::minutes(CONVERSATION_TTL_MINUTES);
    let record = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT message_history
        FROM conversations
        WHERE user_id = ? AND latest_message_at > ?
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .fetch_optional(pool)
    .await?;

    match record {
        Some((raw,)) => {
            let messages: Vec<HistoryMessage> =
                serde_json::from_str(&raw).map_err(|e| DatabaseError::Corrupt {
                    entity: "Conversation",
                    id: user_id.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Conversation {
                user_id: user_id.to_string(),
                messages,
            })
        }
        None => Ok(Conversation::empty(user_id)),
    }
}

/// Save a conversation, stamping `now` as its latest activity.
pub async fn save_conversation(
    pool: &SqlitePool,
    conversation: &Conversation,
    now: DateTime<Utc>,
) -> Result<()> {
    let raw = serde_json::to_string(&conversation.messages).map_err(|e| {
        DatabaseError::Corrupt {
            entity: "Conversation",
            id: conversation.user_id.clone(),
            reason: e.to_string(),
        }
    })?;

    sqlx::query(
        r#"
        INSERT INTO conversations (user_id, message_history, latest_message_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            message_history = excluded.message_history,
            latest_message_at = excluded.latest_message_at
        "#,
    )
    .bind(&conversation.user_id)
    .bind(raw)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete conversations with no activity inside the TTL.
pub async fn prune_stale_conversations(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - Duration::minutes(CONVERSATION_TTL_MINUTES);
    let result = sqlx::query(
        r#"
        DELETE FROM conversations
        WHERE latest_message_at < ?
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
