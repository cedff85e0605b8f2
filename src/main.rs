/// Entry point for the Creo Logstream container log forwarder.
///
/// Connects to the local docker daemon and to redis, then forwards the output of every
/// running container into the redis stream `logs:<container id>` until it receives
/// Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., invalid environment variables, an
/// unreachable docker daemon or redis server).
///
/// # Examples
///
/// ```bash
/// REDIS_ADDR=localhost:6379 RUST_LOG=info cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    creo_logstream::run().await
}
