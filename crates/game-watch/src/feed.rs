//! Presence feed trait and snapshot helpers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::WatchError;

/// One player currently observed playing the watched game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerActivity {
    /// Opaque chat-platform user identifier.
    pub user_id: String,
    /// The platform's recorded activity start, when it reports one.
    pub started_at: Option<DateTime<Utc>>,
}

impl PlayerActivity {
    /// Convenience constructor.
    pub fn new(user_id: impl Into<String>, started_at: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id: user_id.into(),
            started_at,
        }
    }
}

/// Source of the "who is playing right now" snapshot.
///
/// Abstracted so the sync loop can run against any chat platform (or a
/// fixture in tests). Implementations may report the same user more than
/// once (e.g. from several servers); the reconciler deduplicates.
#[async_trait]
pub trait PresenceFeed: Send + Sync {
    /// The full set of players currently observed playing.
    async fn active_players(&self) -> Result<Vec<PlayerActivity>, WatchError>;
}

/// Deduplicate a snapshot by user, first occurrence wins.
pub fn dedup_players(players: Vec<PlayerActivity>) -> Vec<(String, Option<DateTime<Utc>>)> {
    let mut seen = std::collections::HashSet::new();
    players
        .into_iter()
        .filter(|p| seen.insert(p.user_id.clone()))
        .map(|p| (p.user_id, p.started_at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap();

        let players = vec![
            PlayerActivity::new("alice", Some(t1)),
            PlayerActivity::new("bob", None),
            PlayerActivity::new("alice", Some(t2)),
        ];

        let deduped = dedup_players(players);
        assert_eq!(
            deduped,
            vec![
                ("alice".to_string(), Some(t1)),
                ("bob".to_string(), None),
            ]
        );
    }
}
