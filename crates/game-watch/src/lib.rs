//! Game watching and nudge dispatch for Winddown.
//!
//! This crate wires the session store and the timing engine into a running
//! bot: a [`PresenceReconciler`] keeps stored sessions in step with what a
//! [`PresenceFeed`] observes, a [`NudgeDispatcher`] sends due nudges through
//! a [`MessageGenerator`] and a [`Notifier`], and a [`GameWatcher`] runs both
//! on their own cadences.
//!
//! The feed, generator, and notifier are traits so the same loops run against
//! any chat platform or model backend, and against fixtures in tests.

pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod generator;
pub mod notifier;
pub mod prompt;
pub mod reconciler;
pub mod watcher;

pub use dispatcher::{DispatchOutcome, NudgeDispatcher};
pub use error::WatchError;
pub use feed::{PlayerActivity, PresenceFeed};
pub use generator::{EchoGenerator, MessageGenerator};
pub use notifier::{LoggingNotifier, NoOpNotifier, Notifier};
pub use reconciler::PresenceReconciler;
pub use watcher::{GameWatcher, DEFAULT_DISPATCH_INTERVAL, DEFAULT_SYNC_INTERVAL};
