//! In-memory stand-ins for the container runtime and the stream backend.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::{StreamExt, stream};

use crate::container::{ContainerID, ContainerRecord};
use crate::persistence::{self, LogEvent, StreamAppender, StreamKey};
use crate::runtime::{self, ContainerRuntime, LogStream};

/// Scripted output of one container.
#[derive(Debug, Clone, Default)]
pub struct FakeStream {
    chunks: Vec<Bytes>,
    error: Option<&'static str>,
    stay_open: bool,
}

impl FakeStream {
    /// Yields `chunks` and ends.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    /// Yields each string as one chunk and ends.
    pub fn closing(chunks: impl IntoIterator<Item = &'static str>) -> Self {
        Self::from_chunks(
            chunks
                .into_iter()
                .map(|c| Bytes::from_static(c.as_bytes()))
                .collect(),
        )
    }

    /// Yields each string as one chunk and then stays open without further output.
    pub fn open(chunks: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            stay_open: true,
            ..Self::closing(chunks)
        }
    }

    /// Fails with a read error after the scripted chunks.
    pub fn with_error(mut self, message: &'static str) -> Self {
        self.error = Some(message);
        self
    }

    fn into_log_stream(self) -> LogStream {
        let mut items: Vec<runtime::Result<Bytes>> = self.chunks.into_iter().map(Ok).collect();
        if let Some(message) = self.error {
            items.push(Err(runtime::Error::StreamRead(message.into())));
        }
        let scripted = stream::iter(items);
        if self.stay_open {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeRuntime {
    running: Mutex<Vec<ContainerRecord>>,
    failing_listings: AtomicUsize,
    list_calls: AtomicUsize,
    streams: Mutex<HashMap<ContainerID, FakeStream>>,
    opens: Mutex<HashMap<ContainerID, usize>>,
}

impl FakeRuntime {
    pub fn set_running(&self, records: Vec<ContainerRecord>) {
        *self.running.lock().unwrap() = records;
    }

    /// Makes the next `n` listings fail.
    pub fn fail_next_listings(&self, n: usize) {
        self.failing_listings.store(n, Ordering::SeqCst);
    }

    /// Scripts the output of `id`. Containers without a script cannot be attached to.
    pub fn set_stream(&self, id: &ContainerID, stream: FakeStream) {
        self.streams.lock().unwrap().insert(id.clone(), stream);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn opens(&self, id: &ContainerID) -> usize {
        self.opens.lock().unwrap().get(id).copied().unwrap_or_default()
    }
}

impl ContainerRuntime for FakeRuntime {
    async fn list_running_units(&self) -> runtime::Result<Vec<ContainerRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failing_listings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(runtime::Error::RuntimeQuery("daemon unreachable".into()));
        }
        Ok(self.running.lock().unwrap().clone())
    }

    async fn open_log_stream(&self, id: &ContainerID) -> runtime::Result<LogStream> {
        *self.opens.lock().unwrap().entry(id.clone()).or_default() += 1;
        match self.streams.lock().unwrap().get(id) {
            Some(stream) => Ok(stream.clone().into_log_stream()),
            None => Err(runtime::Error::ContainerGone { id: id.clone() }),
        }
    }
}

/// Records appended events; optionally fails the first few appends.
#[derive(Debug, Clone, Default)]
pub struct RecordingAppender {
    entries: Arc<Mutex<Vec<(StreamKey, LogEvent)>>>,
    attempts: Arc<AtomicUsize>,
    fail_first: usize,
}

impl RecordingAppender {
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<(StreamKey, LogEvent)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.message().to_owned())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl StreamAppender for RecordingAppender {
    async fn append(&self, key: &StreamKey, event: &LogEvent) -> persistence::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(persistence::Error::AppendError {
                key: key.to_string(),
                source: "backend unavailable".into(),
            });
        }
        self.entries
            .lock()
            .unwrap()
            .push((key.clone(), event.clone()));
        Ok(())
    }
}
