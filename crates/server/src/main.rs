// crates/server/src/main.rs
//! Asset progress server binary.
//!
//! Reads configuration from the environment, validates the built-in catalog
//! and serves the HTTP API until interrupted.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use asset_progress_core::default_project;
use asset_progress_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warn,asset_progress_server=info,asset_progress_core=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let catalog = default_project();
    catalog.validate()?;

    tracing::info!(
        project_id = %catalog.id,
        tasks = catalog.tasks.len(),
        channel_capacity = config.channel_capacity,
        subtask_timeout_secs = config.subtask_timeout.map(|d| d.as_secs()),
        "Loaded asset catalog"
    );

    let addr = config.bind_addr();
    let state = AppState::new(config, catalog);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("asset-progress listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("asset-progress shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
