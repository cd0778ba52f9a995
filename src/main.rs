//! barehttp: a minimal HTTP/1.1 file and echo server.
//!
//! Configuration via CLI flags or a TOML file; see `barehttp --help`.

use std::sync::Arc;

use barehttp::config::Config;
use barehttp::storage::FileStore;
use barehttp::{Server, handlers};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // RUST_LOG, when set, overrides the configured level.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        directory = %config.directory.display(),
        max_connections = ?config.max_connections,
        read_timeout = ?config.read_timeout,
        "starting barehttp"
    );

    let store = FileStore::open(&config.directory).await?;
    let router = handlers::router(Arc::new(store));

    Server::bind(&config.listen)
        .await?
        .max_connections(config.max_connections)
        .read_timeout(config.read_timeout)
        .run(router)
        .await?;

    Ok(())
}
