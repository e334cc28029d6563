//! Batch processing: the per-batch driver, notification sinks and the
//! background worker.

/// Sequential batch driver.
pub mod processor;
/// Match and completion sinks.
pub mod sink;
/// Background worker thread.
pub mod worker;

pub use processor::{BatchId, BatchProcessor, BatchReport, CancellationToken};
pub use sink::{ChannelSink, MatchResult, MatchedEvent, Notification, NotificationSink, NotificationStream};
pub use worker::{BatchHandle, BatchWorker};
