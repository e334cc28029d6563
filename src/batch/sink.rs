//! Notification sinks.
//!
//! The processor hands every match to a [`NotificationSink`] the moment it is
//! found, and signals completion once per successful batch. [`ChannelSink`]
//! forwards both into a [`NotificationStream`] for consumers on other threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::warn;

use crate::config::ProcessorConfig;
use crate::error::{PushError, PushResult};
use crate::event::Event;
use crate::rule::PushRule;

/// An event together with the rule it matched.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub event: &'a Event,
    pub rule: &'a PushRule,
}

impl MatchResult<'_> {
    /// Clones into an owned value that can cross threads.
    #[must_use]
    pub fn to_matched(&self) -> MatchedEvent {
        MatchedEvent {
            event: self.event.clone(),
            rule: self.rule.clone(),
        }
    }
}

/// Owned form of [`MatchResult`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEvent {
    pub event: Event,
    pub rule: PushRule,
}

/// Receives matches and batch completion.
pub trait NotificationSink: Send + Sync {
    /// Called synchronously for each matched event, in batch order.
    fn on_match(&self, result: &MatchResult<'_>);

    /// Called once after every event of a successful batch.
    fn on_batch_finished(&self);
}

/// Item delivered on a [`NotificationStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An event matched a rule.
    Bing(MatchedEvent),
    /// A batch completed.
    BatchFinished,
}

/// Sink that forwards into a bounded channel.
///
/// Sends never block the batch: a notification that finds the stream full,
/// or already dropped, is discarded and counted in [`ChannelSink::dropped`].
/// Size the stream for the largest batch when every notification matters.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<Notification>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Creates a sink and the stream it feeds.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, NotificationStream) {
        let (tx, rx) = bounded(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            NotificationStream { rx },
        )
    }

    /// Creates a sink whose stream holds `cfg.stream_capacity` notifications.
    #[must_use]
    pub fn from_config(cfg: &ProcessorConfig) -> (Self, NotificationStream) {
        Self::new(cfg.stream_capacity)
    }

    /// Notifications discarded because the stream was full or gone.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, n: Notification) {
        match self.tx.try_send(n) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped = total, "notification stream full, dropping notification");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl NotificationSink for ChannelSink {
    fn on_match(&self, result: &MatchResult<'_>) {
        self.send(Notification::Bing(result.to_matched()));
    }

    fn on_batch_finished(&self) {
        self.send(Notification::BatchFinished);
    }
}

/// Consumer end of a [`ChannelSink`].
#[derive(Debug)]
pub struct NotificationStream {
    rx: Receiver<Notification>,
}

impl NotificationStream {
    /// Receive the next notification (blocking).
    pub fn recv(&self) -> PushResult<Notification> {
        self.rx.recv().map_err(|_| PushError::disconnected("notification_stream"))
    }

    /// Receive the next notification with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> PushResult<Notification> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => PushError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            RecvTimeoutError::Disconnected => PushError::disconnected("notification_stream"),
        })
    }

    /// Non-blocking receive; `Ok(None)` when nothing is queued.
    pub fn try_recv(&self) -> PushResult<Option<Notification>> {
        match self.rx.try_recv() {
            Ok(n) => Ok(Some(n)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(PushError::disconnected("notification_stream")),
        }
    }

    /// Everything currently queued, without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.rx.try_iter().collect()
    }
}
