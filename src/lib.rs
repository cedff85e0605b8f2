use std::sync::Arc;

use persistence::{EventPublisher, RedisStreamAppender};
use runtime::DockerRuntime;

/// Creo Logstream: forwards the output of every running container into per-container
/// Redis streams.
///
/// The library discovers containers through the docker API, follows each container's
/// combined stdout/stderr, strips the runtime's frame headers and appends every line as
/// an entry to the stream `logs:<container id>`.
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod persistence;
pub mod runtime;
pub mod stream;

#[cfg(test)]
mod testing;

/// Runs the log forwarder until the process receives Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if startup fails, i.e., the configuration is invalid, the docker
/// daemon cannot be reached, or redis does not answer. Nothing that happens after startup
/// is fatal.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Configuration: {:?}", config);

    let runtime = DockerRuntime::connect()?;
    let appender = RedisStreamAppender::connect(&config.redis_url).await?;

    let discoverer = Arc::new(discovery::Discoverer::new(
        Arc::new(runtime),
        EventPublisher::new(appender),
        config.worker,
    ));

    log::info!("Starting log collector...");
    let discovery_task = tokio::spawn({
        let discoverer = Arc::clone(&discoverer);
        async move { discoverer.run().await }
    });

    shutdown_signal().await?;
    log::info!("Shutdown signal received");

    discoverer.shutdown(config.shutdown_grace).await;
    discovery_task.await?;
    log::info!("Log collector stopped");

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
