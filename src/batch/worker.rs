//! Background batch worker.
//!
//! Runs a [`BatchProcessor`] on a dedicated thread so callers can hand off a
//! batch and continue. Batches are processed strictly in submission order,
//! one at a time. The job queue is bounded; `submit` blocks when it is full.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

use crate::error::{PushError, PushResult};
use crate::event::Event;
use crate::rule::PushRule;

use super::processor::{BatchProcessor, BatchReport, CancellationToken};

struct Job {
    events: Vec<Event>,
    rules: Arc<[PushRule]>,
    token: CancellationToken,
    reply: Sender<PushResult<BatchReport>>,
}

/// Pending result of a submitted batch.
#[derive(Debug)]
pub struct BatchHandle {
    rx: Receiver<PushResult<BatchReport>>,
    token: CancellationToken,
}

impl BatchHandle {
    /// Requests cancellation of this batch.
    ///
    /// A batch that has not finished yet reports `PushError::Cancelled` and
    /// signals no completion.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the batch completes.
    pub fn wait(self) -> PushResult<BatchReport> {
        self.rx.recv().map_err(|_| PushError::disconnected("batch_worker"))?
    }

    /// Blocks until the batch completes or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> PushResult<BatchReport> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PushError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(PushError::disconnected("batch_worker")),
        }
    }
}

/// Owns a processor thread and its job queue.
#[derive(Debug)]
pub struct BatchWorker {
    jobs: Option<Sender<Job>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl BatchWorker {
    /// Spawns the worker thread.
    ///
    /// # Errors
    /// Fails if the OS refuses to create the thread.
    pub fn spawn(processor: BatchProcessor) -> PushResult<Self> {
        let capacity = processor.config().worker_queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(capacity);

        let join = thread::Builder::new()
            .name("pushrules-batch".to_string())
            .spawn(move || worker_loop(&processor, &rx))
            .map_err(|e| PushError::internal(format!("failed to spawn batch worker: {e}")))?;

        Ok(Self {
            jobs: Some(tx),
            join: Mutex::new(Some(join)),
        })
    }

    /// Queues a batch. `rules` must be in priority order.
    pub fn submit(
        &self,
        events: Vec<Event>,
        rules: impl Into<Arc<[PushRule]>>,
    ) -> PushResult<BatchHandle> {
        let jobs = self.jobs.as_ref().ok_or_else(|| PushError::disconnected("batch_worker"))?;
        let (reply, rx) = bounded(1);
        let token = CancellationToken::new();

        jobs.send(Job {
            events,
            rules: rules.into(),
            token: token.clone(),
            reply,
        })
        .map_err(|_| PushError::disconnected("batch_worker"))?;

        Ok(BatchHandle { rx, token })
    }

    /// Stops accepting batches and waits for queued ones to finish.
    pub fn shutdown(mut self) {
        self.jobs.take();
        let handle = self.join.lock().ok().and_then(|mut g| g.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for BatchWorker {
    fn drop(&mut self) {
        // Close the queue; the worker exits after draining it.
        // Not joined here: a sink blocked on a full stream would deadlock drop.
        self.jobs.take();
        if let Ok(mut guard) = self.join.lock() {
            drop(guard.take());
        }
    }
}

fn worker_loop(processor: &BatchProcessor, jobs: &Receiver<Job>) {
    for job in jobs {
        let result = processor.process_with_cancel(&job.events, &job.rules, &job.token);
        if job.reply.send(result).is_err() {
            debug!("batch handle dropped before completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::sink::{ChannelSink, Notification};
    use crate::config::ProcessorConfig;
    use crate::provider::{InMemoryRoomData, StaticIdentity};

    fn worker() -> (BatchWorker, crate::batch::NotificationStream) {
        let (sink, stream) = ChannelSink::from_config(&ProcessorConfig::default());
        let processor = BatchProcessor::new(
            Arc::new(InMemoryRoomData::new()),
            Arc::new(StaticIdentity::new("@alice:hs")),
            Arc::new(sink),
        );
        (BatchWorker::spawn(processor).unwrap(), stream)
    }

    #[test]
    fn batches_complete_in_submission_order() {
        let (worker, stream) = worker();
        let rules = vec![PushRule::new("all")];

        let h1 = worker
            .submit(vec![Event::text_message("$1", "@bob:hs", "!r:hs", "a")], rules.clone())
            .unwrap();
        let h2 = worker
            .submit(vec![Event::text_message("$2", "@bob:hs", "!r:hs", "b")], rules)
            .unwrap();

        assert_eq!(h1.wait().unwrap().matched, 1);
        assert_eq!(h2.wait().unwrap().matched, 1);

        let ids: Vec<String> = stream
            .drain()
            .into_iter()
            .map(|n| match n {
                Notification::Bing(m) => m.event.event_id.to_string(),
                Notification::BatchFinished => "finished".to_string(),
            })
            .collect();
        assert_eq!(ids, vec!["$1", "finished", "$2", "finished"]);

        worker.shutdown();
    }

    #[test]
    fn wait_timeout_returns_report() {
        let (worker, _stream) = worker();
        let handle = worker.submit(Vec::new(), Vec::<PushRule>::new()).unwrap();
        let report = handle.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(report.decisions(), 0);
    }
}
