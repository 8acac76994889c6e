//! Firecast worker binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use firecast_azuracast::AzuraCastClient;
use firecast_worker::{Downloader, JobExecutor, JobProcessor, QueueClient, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing()?;

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting firecast-worker");

    let config = WorkerConfig::from_env();
    info!(
        "Worker config: server={}, poll_interval={:?}, work_dir={}",
        config.server_url,
        config.poll_interval,
        config.work_dir.display()
    );
    if config.secret.is_empty() {
        warn!("FIRECAST_SECRET is not set; the API will reject every request");
    }

    let azuracast = AzuraCastClient::from_env().context("AzuraCast client")?;
    let downloader = Downloader::new(&config).await.context("yt-dlp setup")?;
    let client = QueueClient::new(&config).context("Queue client")?;

    let executor = JobExecutor::new(
        client,
        JobProcessor::new(downloader, Arc::new(azuracast)),
        config.poll_interval,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, finishing current job");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                // Keep the sender alive so the executor keeps running.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    executor.run(shutdown_rx).await;

    info!("Worker shutdown complete");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("firecast=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }
    Ok(())
}
