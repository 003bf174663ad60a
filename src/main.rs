//! dashprobe - collector orchestration runtime and terminal image renderer
//!
//! Minimal process entry point: loads configuration, starts the collector
//! runner, and serves until interrupted. Wiring this runtime into a
//! dashboard's prompt-augmentation pipeline is left to the embedding
//! application.

use eyre::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dashprobe::config::RuntimeConfig;
use dashprobe::{Registry, Runner};

fn setup_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let config = RuntimeConfig::load(None).context("Failed to load configuration")?;
    info!(
        max_cache_size_mb = config.image.max_cache_size_mb,
        async_workers = config.image.async_workers,
        "dashprobe started"
    );

    let registry = Arc::new(Registry::new());
    let (updates_tx, mut updates_rx) = tokio::sync::mpsc::channel(config.collectors.update_channel_capacity);
    let runner = Runner::new(Arc::clone(&registry), updates_tx);

    let root = CancellationToken::new();
    runner.start(root.clone());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            update = updates_rx.recv() => {
                match update {
                    Some(update) => info!(source = %update.source, success = update.is_success(), "collector update"),
                    None => break,
                }
            }
        }
    }

    root.cancel();
    runner.stop().await;
    Ok(())
}
