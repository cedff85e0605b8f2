//! Access to the container runtime.
//!
//! The forwarder only needs two things from a runtime: the set of currently running
//! containers and a follow-mode attachment to a container's combined output. Both are
//! expressed by [`ContainerRuntime`]; [`DockerRuntime`] implements it on top of the
//! Docker Engine API.
mod docker;
mod error;

use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::container::{ContainerID, ContainerRecord};

pub use docker::{DockerRuntime, encode_frame};
pub use error::{BoxError, Error, Result};

/// Raw output of a container attachment: framed lines, chunked arbitrarily.
pub type LogStream = BoxStream<'static, Result<Bytes>>;

pub trait ContainerRuntime: Send + Sync + 'static {
    /// Lists the containers that are currently running.
    fn list_running_units(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ContainerRecord>>> + Send;

    /// Attaches to the combined stdout/stderr of a container in follow mode, starting
    /// from now (no backlog, no source timestamps).
    fn open_log_stream(
        &self,
        id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<LogStream>> + Send;
}
