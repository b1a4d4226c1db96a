//! Notifier trait and implementations.

use async_trait::async_trait;

use crate::error::WatchError;

/// Trait for delivering nudges to players.
///
/// Abstracted to support different transports (chat platform DMs, tests).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a direct message to a user.
    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), WatchError>;
}

/// A no-op notifier for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send_direct_message(&self, _user_id: &str, _text: &str) -> Result<(), WatchError> {
        Ok(())
    }
}

/// A logging notifier for dry runs that logs instead of delivering.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), WatchError> {
        tracing::info!("Would message {}: {}", user_id, text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_notifier() {
        let notifier = NoOpNotifier;
        notifier.send_direct_message("alice", "test").await.unwrap();
    }

    #[tokio::test]
    async fn test_logging_notifier() {
        let notifier = LoggingNotifier;
        notifier.send_direct_message("alice", "test").await.unwrap();
    }
}
