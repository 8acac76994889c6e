//! Firecast API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use firecast_api::{create_router, metrics, ApiConfig, AppState};
use firecast_queue::LeaseSweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing()?;

    // Required for rustls 0.23+ (Redis TLS and AzuraCast HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting firecast-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, backend={:?}",
        config.host, config.port, config.queue_backend
    );
    if config.secret.is_empty() {
        warn!("FIRECAST_SECRET is not set; every authenticated endpoint will reject requests");
    }

    let state = match AppState::new(config.clone()).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    // Lease sweeper, stopped through the watch channel on shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = if config.sweeper_enabled {
        let sweeper = LeaseSweeper::from_queue(&state.queue);
        Some(tokio::spawn(async move { sweeper.run(shutdown_rx).await }))
    } else {
        info!("Lease sweeper disabled");
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = sweeper_task {
        if let Err(e) = task.await {
            error!("Lease sweeper task failed: {}", e);
        }
    }

    info!("Server shutdown complete");
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
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
