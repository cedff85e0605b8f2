use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{
    InspectContainerOptions, InspectContainerOptionsBuilder, ListContainersOptionsBuilder,
    LogsOptionsBuilder,
};
use bytes::{BufMut, Bytes, BytesMut};
use futures_util::StreamExt;

use crate::container::{ContainerID, ContainerRecord};

use super::{ContainerRuntime, Error, LogStream, Result};

/// Size of the header docker puts in front of every multiplexed output frame.
const FRAME_HEADER_LEN: usize = 8;

/// [`ContainerRuntime`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects using the local defaults, i.e., `DOCKER_HOST` if set and the platform
    /// socket otherwise.
    pub fn connect() -> Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().map_err(|err| Error::Connect(Box::new(err)))?;
        Ok(Self::new(docker))
    }

    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

impl ContainerRuntime for DockerRuntime {
    async fn list_running_units(&self) -> Result<Vec<ContainerRecord>> {
        let options = ListContainersOptionsBuilder::new().all(false).build();
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|err| Error::RuntimeQuery(Box::new(err)))?;

        let mut records = Vec::with_capacity(containers.len());
        for summary in containers {
            let Some(raw_id) = summary.id else {
                log::warn!("skipping container summary without id");
                continue;
            };
            let id = match ContainerID::new(&raw_id) {
                Ok(id) => id,
                Err(err) => {
                    log::warn!("skipping container: {}", err);
                    continue;
                }
            };
            let name = summary
                .names
                .and_then(|names| names.into_iter().next())
                .unwrap_or_else(|| id.short().to_owned());
            records.push(ContainerRecord::new(id, name));
        }

        Ok(records)
    }

    async fn open_log_stream(&self, id: &ContainerID) -> Result<LogStream> {
        // `logs` only reports a missing container once polled, so check up front.
        let inspect: InspectContainerOptions = InspectContainerOptionsBuilder::new().build();
        match self.docker.inspect_container(id.as_str(), Some(inspect)).await {
            Ok(_) => {}
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => return Err(Error::ContainerGone { id: id.clone() }),
            Err(err) => {
                return Err(Error::StreamOpen {
                    id: id.clone(),
                    source: Box::new(err),
                });
            }
        }

        let options = LogsOptionsBuilder::new()
            .follow(true)
            .stdout(true)
            .stderr(true)
            .timestamps(false)
            .tail("0")
            .build();

        let stream = self
            .docker
            .logs(id.as_str(), Some(options))
            .map(|item| match item {
                Ok(output) => Ok(encode_frame(output)),
                Err(err) => Err(Error::StreamRead(Box::new(err))),
            })
            .boxed();

        Ok(stream)
    }
}

/// Restores the wire framing of a demultiplexed docker log frame.
///
/// bollard strips the 8-byte header (stream type, three zero bytes, big-endian payload
/// length) while decoding. Lines are normalized against the raw wire format, so the header
/// is put back. Console output of TTY containers carries no header and is passed through.
pub fn encode_frame(output: LogOutput) -> Bytes {
    let (stream_type, message) = match output {
        LogOutput::StdIn { message } => (0u8, message),
        LogOutput::StdOut { message } => (1u8, message),
        LogOutput::StdErr { message } => (2u8, message),
        LogOutput::Console { message } => return message,
    };

    let mut frame = BytesMut::with_capacity(FRAME_HEADER_LEN + message.len());
    frame.put_u8(stream_type);
    frame.put_bytes(0, 3);
    frame.put_u32(message.len() as u32);
    frame.extend_from_slice(&message);
    frame.freeze()
}
