use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;

use crate::container::ContainerID;

/// Lifecycle of the worker attached to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Marked for attachment, worker not yet spawned.
    Pending,
    /// Worker is running.
    Active,
    /// Worker has exited. The container is not attached again while it keeps running.
    Done,
}

#[derive(Debug)]
struct TrackedWorker {
    state: WorkerState,
    handle: Option<JoinHandle<()>>,
}

/// Containers that already have a log worker, keyed by container id.
///
/// Guarantees at most one worker per container. Entries of finished workers are kept
/// until [`TrackedSet::prune`] learns the container is gone.
#[derive(Debug, Default)]
pub struct TrackedSet {
    workers: DashMap<ContainerID, TrackedWorker>,
}

impl TrackedSet {
    pub fn contains(&self, id: &ContainerID) -> bool {
        self.workers.contains_key(id)
    }

    /// Marks `id` as tracked.
    ///
    /// Returns `true` if the id was not tracked before, i.e., the caller owns the right to
    /// spawn its worker. Marking an already tracked id changes nothing.
    pub fn mark(&self, id: &ContainerID) -> bool {
        match self.workers.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(TrackedWorker {
                    state: WorkerState::Pending,
                    handle: None,
                });
                true
            }
        }
    }

    /// Stores the handle of the spawned worker.
    ///
    /// A worker that already finished stays [`WorkerState::Done`].
    pub fn activate(&self, id: &ContainerID, handle: JoinHandle<()>) {
        match self.workers.get_mut(id) {
            Some(mut tracked) => {
                if tracked.state == WorkerState::Pending {
                    tracked.state = WorkerState::Active;
                }
                tracked.handle = Some(handle);
            }
            None => {
                log::warn!("activating untracked container {}", id.short());
                self.workers.insert(
                    id.clone(),
                    TrackedWorker {
                        state: WorkerState::Active,
                        handle: Some(handle),
                    },
                );
            }
        }
    }

    /// Records that the worker of `id` has exited.
    pub fn finish(&self, id: &ContainerID) {
        if let Some(mut tracked) = self.workers.get_mut(id) {
            tracked.state = WorkerState::Done;
        }
    }

    pub fn state(&self, id: &ContainerID) -> Option<WorkerState> {
        self.workers.get(id).map(|tracked| tracked.state)
    }

    /// Forgets finished workers of containers that are no longer running.
    ///
    /// Returns the number of removed entries.
    pub fn prune(&self, running: &HashSet<ContainerID>) -> usize {
        let before = self.workers.len();
        self.workers
            .retain(|id, tracked| tracked.state != WorkerState::Done || running.contains(id));
        before - self.workers.len()
    }

    /// Takes the join handles of all spawned workers.
    pub fn take_handles(&self) -> Vec<JoinHandle<()>> {
        self.workers
            .iter_mut()
            .filter_map(|mut tracked| tracked.handle.take())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|tracked| tracked.state == WorkerState::Active)
            .count()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
