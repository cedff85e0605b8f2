use crate::container::ContainerID;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to container runtime: {0}")]
    Connect(#[source] BoxError),
    #[error("failed to list running containers: {0}")]
    RuntimeQuery(#[source] BoxError),
    #[error("container `{id}` no longer exists")]
    ContainerGone { id: ContainerID },
    #[error("failed to open log stream for container `{id}`: {source}")]
    StreamOpen {
        id: ContainerID,
        #[source]
        source: BoxError,
    },
    #[error("failed to read log stream: {0}")]
    StreamRead(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, Error>;
