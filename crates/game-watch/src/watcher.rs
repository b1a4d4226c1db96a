//! The long-running watch loop.

use chrono::Utc;
use database::SyncOutcome;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::dispatcher::NudgeDispatcher;
use crate::error::WatchError;
use crate::feed::PresenceFeed;
use crate::generator::MessageGenerator;
use crate::notifier::Notifier;
use crate::reconciler::PresenceReconciler;

/// Default gap between presence sync cycles.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default gap between dispatch passes.
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the two periodic loops of the bot: a presence sync against the feed
/// and a nudge dispatch pass over the store.
///
/// Errors in either loop are logged and the loop carries on; a flaky feed or
/// generator should never take the watcher down.
pub struct GameWatcher<F, G, N> {
    feed: F,
    reconciler: PresenceReconciler,
    dispatcher: NudgeDispatcher<G, N>,
    sync_interval: Duration,
    dispatch_interval: Duration,
}

impl<F, G, N> GameWatcher<F, G, N>
where
    F: PresenceFeed,
    G: MessageGenerator,
    N: Notifier,
{
    /// Create a watcher with the default cadences.
    pub fn new(feed: F, reconciler: PresenceReconciler, dispatcher: NudgeDispatcher<G, N>) -> Self {
        Self {
            feed,
            reconciler,
            dispatcher,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
        }
    }

    /// Override how often the presence feed is polled.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Override how often due nudges are dispatched.
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    /// Run both loops until the task is cancelled.
    pub async fn run(&self) {
        info!(
            sync_interval_secs = self.sync_interval.as_secs(),
            dispatch_interval_secs = self.dispatch_interval.as_secs(),
            "Game watcher started"
        );

        let mut sync_tick = interval(self.sync_interval);
        let mut dispatch_tick = interval(self.dispatch_interval);
        sync_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        dispatch_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sync_tick.tick() => {
                    if let Err(e) = self.sync_once().await {
                        error!("Presence sync failed: {}", e);
                    }
                }
                _ = dispatch_tick.tick() => {
                    if let Err(e) = self.dispatcher.run_once(Utc::now()).await {
                        error!("Dispatch pass failed: {}", e);
                    }
                }
            }
        }
    }

    /// Poll the feed once and reconcile the snapshot.
    pub async fn sync_once(&self) -> Result<SyncOutcome, WatchError> {
        let players = self.feed.active_players().await?;
        self.reconciler.sync(players, Utc::now()).await
    }
}
