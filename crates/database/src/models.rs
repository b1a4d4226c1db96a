//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A tracked play session. One row per user; an absent `ended_at` means the
/// session is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GameSession {
    /// Opaque chat-platform user identifier.
    pub user_id: String,
    /// When the session began. Set once and preserved across presence blips.
    pub started_at: DateTime<Utc>,
    /// When the session ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
    /// Suppress nudges for this session without ending it.
    pub muted: bool,
    /// Minutes between duration nudges.
    pub duration_nudge_minutes: i64,
    /// Minutes between lateness nudges.
    pub lateness_nudge_minutes: i64,
    /// Last time a nudge of either kind was sent for this session.
    pub latest_nudge_at: Option<DateTime<Utc>>,
}

/// Per-user settings. Created lazily; absent rows mean defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    /// Opaque chat-platform user identifier.
    pub user_id: String,
    /// IANA time zone name, if the user has set one.
    pub time_zone: Option<String>,
    /// Excluded from nudge consideration entirely.
    pub blocked: bool,
}

impl UserSettings {
    /// Default settings for a user with no stored row.
    pub fn defaults(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            time_zone: None,
            blocked: false,
        }
    }
}

/// An open, unmuted, unblocked session joined with the owner's settings.
/// This is the row shape the nudge dispatcher works from.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NudgeCandidate {
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_nudge_minutes: i64,
    pub lateness_nudge_minutes: i64,
    pub latest_nudge_at: Option<DateTime<Utc>>,
    /// From the settings sidecar; `None` when the user never set a zone.
    pub time_zone: Option<String>,
}

/// One entry in a conversation's message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// "user" or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A user's conversation with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    /// Opaque chat-platform user identifier.
    pub user_id: String,
    /// Ordered message history, oldest first.
    pub messages: Vec<HistoryMessage>,
}

impl Conversation {
    /// An empty conversation for a user.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            messages: Vec::new(),
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(HistoryMessage::user(content));
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(HistoryMessage::assistant(content));
    }
}
