//! Discovery of running containers.
//!
//! [`Discoverer`] polls the container runtime and starts one [`LogStreamWorker`] for every
//! container it has not seen before. Workers are tracked in a [`TrackedSet`] so that a
//! container is never attached twice, and they all hang off the discoverer's cancellation
//! token so [`Discoverer::shutdown`] can stop and flush them.
mod registry;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::container::{ContainerID, ContainerRecord};
use crate::persistence::{EventPublisher, StreamAppender};
use crate::runtime::{self, ContainerRuntime};
use crate::stream::{LogStreamWorker, WorkerConfig};

pub use registry::{TrackedSet, WorkerState};

/// Pause between two successful discovery cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Pause before retrying a failed container listing.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

pub struct Discoverer<R, A> {
    runtime: Arc<R>,
    publisher: EventPublisher<A>,
    registry: Arc<TrackedSet>,
    worker_config: WorkerConfig,
    cancel: CancellationToken,
}

impl<R: ContainerRuntime, A: StreamAppender> Discoverer<R, A> {
    pub fn new(
        runtime: Arc<R>,
        publisher: EventPublisher<A>,
        worker_config: WorkerConfig,
    ) -> Self {
        Self {
            runtime,
            publisher,
            registry: Arc::new(TrackedSet::default()),
            worker_config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &TrackedSet {
        &self.registry
    }

    /// Polls the runtime until [`Discoverer::shutdown`] is called.
    ///
    /// A failing listing is logged and retried after [`RETRY_BACKOFF`]; it never ends the
    /// loop.
    pub async fn run(&self) {
        loop {
            let listed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                listed = self.discover_once() => listed,
            };
            let delay = match listed {
                Ok(started) => {
                    log::trace!(
                        "discovery cycle started {} workers, {} active",
                        started,
                        self.registry.active_count()
                    );
                    POLL_INTERVAL
                }
                Err(err) => {
                    log::error!("Error listing containers: {}", err);
                    RETRY_BACKOFF
                }
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        log::debug!("Container discovery stopped");
    }

    /// Runs a single discovery cycle and returns the number of workers started.
    pub async fn discover_once(&self) -> runtime::Result<usize> {
        let containers = self.runtime.list_running_units().await?;
        let running: HashSet<ContainerID> = containers.iter().map(|c| c.id().clone()).collect();

        let mut started = 0;
        for record in containers {
            if self.cancel.is_cancelled() {
                log::debug!("Shutting down, not attaching further containers");
                break;
            }
            if self.registry.mark(record.id()) {
                self.spawn_worker(record);
                started += 1;
            }
        }

        let pruned = self.registry.prune(&running);
        if pruned > 0 {
            log::debug!("Forgot {} containers that are no longer running", pruned);
        }

        Ok(started)
    }

    fn spawn_worker(&self, record: ContainerRecord) {
        let id = record.id().clone();
        log::info!(
            "Started watching container: {} ({})",
            record.name(),
            id.short()
        );

        let worker = LogStreamWorker::new(
            record,
            Arc::clone(&self.runtime),
            self.publisher.clone(),
            self.worker_config,
            self.cancel.child_token(),
        );
        let finished = FinishOnDrop {
            registry: Arc::clone(&self.registry),
            id: id.clone(),
        };
        let handle = tokio::spawn(async move {
            let _finished = finished;
            worker.run().await;
        });
        self.registry.activate(&id, handle);
    }

    /// Stops discovery and all workers.
    ///
    /// Workers stop reading and publish what they have queued. Workers still busy after
    /// `grace` are aborted.
    pub async fn shutdown(&self, grace: Duration) {
        self.cancel.cancel();

        let mut handles = self.registry.take_handles();
        log::info!("Waiting for {} log workers to flush", handles.len());
        let flushed = tokio::time::timeout(grace, async {
            for handle in handles.iter_mut() {
                if let Err(err) = handle.await {
                    log::error!("log worker failed: {}", err);
                }
            }
        })
        .await;

        if flushed.is_err() {
            log::warn!(
                "log workers did not finish within {:?}, aborting them",
                grace
            );
            for handle in &handles {
                handle.abort();
            }
        }
    }
}

/// Marks a worker as done when its task ends, including by panic or abort.
struct FinishOnDrop {
    registry: Arc<TrackedSet>,
    id: ContainerID,
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.registry.finish(&self.id);
    }
}
