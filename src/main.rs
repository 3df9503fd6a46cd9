mod api;
mod application;
mod config;
mod domain;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::{
    api::AppState,
    application::{DownloadCoordinator, ProcessRunner, ProgressTable, ToolRunner},
    config::ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let default_level = if config.verbose {
        "lesson_video_downloads=debug"
    } else {
        "lesson_video_downloads=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let runner = ProcessRunner::new(config.tool_locator());
    match runner.locate() {
        Ok(path) => tracing::info!("using yt-dlp at {}", path.display()),
        Err(e) => tracing::warn!("{}; downloads will fail until it is installed", e),
    }

    let coordinator = DownloadCoordinator::new(
        config.coordinator_settings(),
        Arc::new(runner),
        ProgressTable::new(),
    );
    let settings = coordinator.settings().clone();
    let app = api::router(AppState { coordinator });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding to {}", config.bind))?;
    tracing::info!(
        dir = %settings.output_dir.display(),
        public_path = %settings.public_path,
        "listening on http://{}",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running download server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", err);
    }
    tracing::info!("shutting down");
}
