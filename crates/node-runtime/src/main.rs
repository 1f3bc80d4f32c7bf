//! Node entry point.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::{Container, NodeConfig, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting image transform node");

    let config = NodeConfig::from_env().context("failed to load configuration")?;
    config
        .validate_for_production()
        .context("configuration failed production validation")?;

    let container = Container::build(config).context("failed to build components")?;
    let mut runtime = NodeRuntime::new(container);
    let addr = runtime.start().await?;
    info!(addr = %addr, "Node ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    runtime.shutdown().await;
    Ok(())
}
