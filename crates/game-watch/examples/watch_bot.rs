//! Winddown bot wired to the OpenAI brain, logging deliveries instead of
//! sending them.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example watch_bot
//! ```
//!
//! Environment:
//! - `OPENAI_API_KEY` (required)
//! - `DATABASE_URL` (default `sqlite:winddown.db?mode=rwc`)
//! - `GAME` (default `Factorio`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::{Database, HistoryMessage};
use game_watch::{
    GameWatcher, LoggingNotifier, MessageGenerator, NudgeDispatcher, PlayerActivity,
    PresenceFeed, PresenceReconciler, WatchError,
};
use openai_brain::{ChatMessage, OpenAiBrain};

/// Adapter exposing the OpenAI brain as the dispatcher's generator.
struct OpenAiGenerator {
    brain: OpenAiBrain,
}

#[async_trait]
impl MessageGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        instructions: &str,
        history: &[HistoryMessage],
        prompt: &str,
    ) -> Result<String, WatchError> {
        let history: Vec<ChatMessage> = history
            .iter()
            .map(|m| ChatMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        self.brain
            .generate(instructions, &history, prompt)
            .await
            .map_err(|e| WatchError::GenerationFailed(e.to_string()))
    }
}

/// Stand-in feed reporting one player who started playing at process start.
struct DemoFeed {
    started_at: DateTime<Utc>,
}

#[async_trait]
impl PresenceFeed for DemoFeed {
    async fn active_players(&self) -> Result<Vec<PlayerActivity>, WatchError> {
        Ok(vec![PlayerActivity::new("demo-player", Some(self.started_at))])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:winddown.db?mode=rwc".to_string());
    let game = std::env::var("GAME").unwrap_or_else(|_| "Factorio".to_string());

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let generator = OpenAiGenerator {
        brain: OpenAiBrain::from_env()?,
    };

    let feed = DemoFeed {
        started_at: Utc::now(),
    };
    let reconciler = PresenceReconciler::new(db.clone());
    let dispatcher = NudgeDispatcher::new(db.clone(), generator, LoggingNotifier, game);

    let watcher = GameWatcher::new(feed, reconciler, dispatcher)
        .with_sync_interval(std::time::Duration::from_secs(30));

    watcher.run().await;

    Ok(())
}
