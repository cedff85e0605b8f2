use std::fmt;
use std::str::FromStr;

use tokio::sync::{broadcast, mpsc};

/// What happens when an event is pushed into a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// The producer waits until the publisher has made room.
    #[default]
    Block,
    /// The oldest queued events are discarded; the producer never waits.
    DropOldest,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown overflow policy `{0}`, expected `block` or `drop-oldest`")]
pub struct ParseOverflowPolicyError(String);

impl FromStr for OverflowPolicy {
    type Err = ParseOverflowPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "drop-oldest" | "drop_oldest" => Ok(Self::DropOldest),
            _ => Err(ParseOverflowPolicyError(s.to_owned())),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::DropOldest => f.write_str("drop-oldest"),
        }
    }
}

/// The receiving side has gone away.
#[derive(Debug, thiserror::Error)]
#[error("event queue closed")]
pub struct QueueClosed;

/// Creates a bounded single-consumer queue.
///
/// # Panics
///
/// Panics if `capacity` is zero. With [`OverflowPolicy::DropOldest`] the capacity is rounded
/// up to the next power of two.
pub fn bounded<T: Clone>(
    capacity: usize,
    policy: OverflowPolicy,
) -> (QueueSender<T>, QueueReceiver<T>) {
    match policy {
        OverflowPolicy::Block => {
            let (tx, rx) = mpsc::channel(capacity);
            (QueueSender::Block(tx), QueueReceiver::Block(rx))
        }
        // A lagging broadcast receiver loses the oldest values, which is exactly drop-oldest.
        OverflowPolicy::DropOldest => {
            let (tx, rx) = broadcast::channel(capacity);
            (QueueSender::DropOldest(tx), QueueReceiver::DropOldest(rx))
        }
    }
}

pub enum QueueSender<T> {
    Block(mpsc::Sender<T>),
    DropOldest(broadcast::Sender<T>),
}

impl<T> QueueSender<T> {
    pub async fn push(&self, item: T) -> Result<(), QueueClosed> {
        match self {
            Self::Block(tx) => tx.send(item).await.map_err(|_| QueueClosed),
            Self::DropOldest(tx) => tx.send(item).map(|_| ()).map_err(|_| QueueClosed),
        }
    }
}

pub enum QueueReceiver<T> {
    Block(mpsc::Receiver<T>),
    DropOldest(broadcast::Receiver<T>),
}

impl<T: Clone> QueueReceiver<T> {
    /// Returns the next item, or `None` once every sender is gone and the queue is drained.
    pub async fn pop(&mut self) -> Option<T> {
        match self {
            Self::Block(rx) => rx.recv().await,
            Self::DropOldest(rx) => loop {
                match rx.recv().await {
                    Ok(item) => return Some(item),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("event queue overflowed, dropped {} oldest events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
        }
    }
}
