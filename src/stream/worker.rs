use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::container::ContainerRecord;
use crate::error::ResultOkLogExt;
use crate::persistence::{EventPublisher, LogEvent, StreamAppender};
use crate::runtime::ContainerRuntime;

use super::lines::LineReader;
use super::normalize::normalize_line;
use super::queue::{self, OverflowPolicy, QueueReceiver, QueueSender};

/// Default number of events buffered between a container's reader and its publisher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Why a [`LogStreamWorker`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The log stream could not be opened.
    OpenFailed,
    /// The container closed its output, usually because it stopped.
    EndOfStream,
    /// Reading from the log stream failed.
    ReadFailed,
    /// The worker was asked to stop.
    Cancelled,
}

/// Forwards the output of one container for as long as its log stream lasts.
///
/// Lines are read and normalized in order and pushed into a bounded queue that is drained
/// by the publisher. A worker is never restarted: once it exits, the container is no
/// longer covered. On cancellation it stops reading and flushes whatever is still queued.
pub struct LogStreamWorker<R, A> {
    record: ContainerRecord,
    runtime: Arc<R>,
    publisher: EventPublisher<A>,
    config: WorkerConfig,
    cancel: CancellationToken,
}

impl<R: ContainerRuntime, A: StreamAppender> LogStreamWorker<R, A> {
    pub fn new(
        record: ContainerRecord,
        runtime: Arc<R>,
        publisher: EventPublisher<A>,
        config: WorkerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            record,
            runtime,
            publisher,
            config,
            cancel,
        }
    }

    pub fn record(&self) -> &ContainerRecord {
        &self.record
    }

    pub async fn run(self) -> WorkerExit {
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return WorkerExit::Cancelled,
            opened = self.runtime.open_log_stream(self.record.id()) => opened,
        };
        let Some(stream) = opened.ok_log() else {
            return WorkerExit::OpenFailed;
        };

        let (tx, rx) = queue::bounded(self.config.queue_capacity, self.config.overflow);
        let (exit, published) = tokio::join!(
            self.read_lines(LineReader::new(stream), tx),
            self.publish_queued(rx)
        );
        log::debug!(
            "Stopped watching container {} ({}): {:?}, {} events published",
            self.record.name(),
            self.record.id().short(),
            exit,
            published
        );

        exit
    }

    /// Reads until the stream ends or the worker is cancelled. Dropping `tx` on return lets
    /// the publisher drain the queue and finish.
    async fn read_lines(&self, mut lines: LineReader, tx: QueueSender<LogEvent>) -> WorkerExit {
        loop {
            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WorkerExit::Cancelled,
                line = lines.next_line() => line,
            };

            let raw = match line {
                Ok(Some(raw)) => raw,
                Ok(None) => return WorkerExit::EndOfStream,
                Err(err) => {
                    log::error!(
                        "Error reading logs for {}: {}",
                        self.record.id().short(),
                        err
                    );
                    return WorkerExit::ReadFailed;
                }
            };
            let Some(message) = normalize_line(&raw) else {
                continue;
            };

            let event = LogEvent::now(&self.record, message);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WorkerExit::Cancelled,
                pushed = tx.push(event) => {
                    if pushed.is_err() {
                        return WorkerExit::Cancelled;
                    }
                }
            }
        }
    }

    async fn publish_queued(&self, mut rx: QueueReceiver<LogEvent>) -> usize {
        let mut published = 0;
        while let Some(event) = rx.pop().await {
            if self.publisher.publish(&event).await {
                published += 1;
            }
        }
        published
    }
}
