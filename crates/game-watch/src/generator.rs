//! Message generator trait.

use async_trait::async_trait;
use database::HistoryMessage;

use crate::error::WatchError;

/// Trait for turning a nudge prompt into message text.
///
/// Abstracted so the dispatcher can run against any language-model backend
/// (or a fixture in tests). `history` is the player's recent conversation,
/// oldest first; the generator must not persist anything.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Generate one message from instructions, history, and a prompt.
    async fn generate(
        &self,
        instructions: &str,
        history: &[HistoryMessage],
        prompt: &str,
    ) -> Result<String, WatchError>;
}

/// A generator for dry runs that echoes the prompt back as the message.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator;

#[async_trait]
impl MessageGenerator for EchoGenerator {
    async fn generate(
        &self,
        _instructions: &str,
        _history: &[HistoryMessage],
        prompt: &str,
    ) -> Result<String, WatchError> {
        Ok(prompt.to_string())
    }
}
