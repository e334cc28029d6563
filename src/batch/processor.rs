//! Batch driver.
//!
//! Runs the rule matcher over an ordered batch of events, one event at a
//! time, and reports matches to the sink as soon as they are found. A batch
//! ends with exactly one completion signal, unless a collaborator fails or
//! the caller cancels, in which case no completion is signalled.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::condition::glob::GlobCache;
use crate::config::ProcessorConfig;
use crate::error::{PushError, PushResult};
use crate::event::Event;
use crate::matcher::RuleMatcher;
use crate::provider::{IdentityProvider, RoomDataProvider};
use crate::resolver::DefaultConditionResolver;
use crate::rule::PushRule;

use super::sink::{MatchResult, NotificationSink};

/// Cooperative cancellation flag shared between a caller and a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once `cancel` was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Identifier of one batch invocation, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random batch id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a successful batch.
///
/// `evaluated + skipped` always equals the number of input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Id of the invocation that produced this report.
    pub batch_id: BatchId,
    /// Events run through the matcher.
    pub evaluated: usize,
    /// Events that matched a rule (a subset of `evaluated`).
    pub matched: usize,
    /// Events skipped as malformed or sent by the local user.
    pub skipped: usize,
}

impl BatchReport {
    fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            evaluated: 0,
            matched: 0,
            skipped: 0,
        }
    }

    /// Number of per-event decisions made.
    #[must_use]
    pub const fn decisions(&self) -> usize {
        self.evaluated + self.skipped
    }
}

/// Drives rule matching over batches of events.
pub struct BatchProcessor {
    rooms: Arc<dyn RoomDataProvider>,
    identity: Arc<dyn IdentityProvider>,
    sink: Arc<dyn NotificationSink>,
    matcher: RuleMatcher,
    globs: GlobCache,
    cfg: ProcessorConfig,
}

impl BatchProcessor {
    /// Creates a processor with the default configuration.
    #[must_use]
    pub fn new(
        rooms: Arc<dyn RoomDataProvider>,
        identity: Arc<dyn IdentityProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_config(rooms, identity, sink, ProcessorConfig::default())
    }

    /// Creates a processor with an explicit configuration.
    #[must_use]
    pub fn with_config(
        rooms: Arc<dyn RoomDataProvider>,
        identity: Arc<dyn IdentityProvider>,
        sink: Arc<dyn NotificationSink>,
        cfg: ProcessorConfig,
    ) -> Self {
        Self {
            rooms,
            identity,
            sink,
            matcher: RuleMatcher::new(),
            globs: GlobCache::new(),
            cfg,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.cfg
    }

    /// Processes `events` against `rules`, which must be in priority order.
    ///
    /// # Errors
    /// A collaborator failure aborts the batch. Matches already delivered to
    /// the sink stay delivered; the completion signal is not sent.
    pub fn process(&self, events: &[Event], rules: &[PushRule]) -> PushResult<BatchReport> {
        self.process_with_cancel(events, rules, &CancellationToken::new())
    }

    /// Like [`process`](Self::process), checking `token` before each event.
    ///
    /// # Errors
    /// `PushError::Cancelled` once the token fires, or any collaborator
    /// failure.
    pub fn process_with_cancel(
        &self,
        events: &[Event],
        rules: &[PushRule],
        token: &CancellationToken,
    ) -> PushResult<BatchReport> {
        let batch_id = BatchId::new();
        let mut report = BatchReport::new(batch_id);

        for event in events {
            if token.is_cancelled() {
                info!(%batch_id, processed = report.decisions(), total = events.len(), "push batch cancelled");
                return Err(PushError::Cancelled);
            }

            if let Err(e) = event.validate() {
                warn!(%batch_id, error = %e, "skipping malformed event");
                report.skipped += 1;
                continue;
            }
            if self.cfg.skip_own_events && &event.sender == self.identity.user_id() {
                debug!(%batch_id, event_id = %event.event_id, "skipping own event");
                report.skipped += 1;
                continue;
            }

            let resolver = DefaultConditionResolver::new(event, self.rooms.as_ref(), self.identity.as_ref())
                .with_default_notification_level(self.cfg.default_notification_level)
                .with_glob_cache(&self.globs);

            let matched = self.matcher.find_match(&resolver, rules).inspect_err(|e| {
                warn!(%batch_id, event_id = %event.event_id, error = %e, "push batch aborted");
            })?;
            report.evaluated += 1;

            if let Some(rule) = matched {
                report.matched += 1;
                self.sink.on_match(&MatchResult { event, rule });
            }
        }

        if token.is_cancelled() {
            return Err(PushError::Cancelled);
        }

        self.sink.on_batch_finished();
        info!(
            %batch_id,
            evaluated = report.evaluated,
            matched = report.matched,
            skipped = report.skipped,
            "push batch finished"
        );
        Ok(report)
    }
}
