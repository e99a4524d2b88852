mod api;
mod bootstrap;
mod bot;
mod health;
mod leads;
mod webhook;

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use vendaflow_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use vendaflow_core::config::LogFormat::*;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let bridge_task = app.state.bridge.clone().map(|bridge| {
        tokio::spawn(async move {
            bridge.start().await;
        })
    });

    let router = api::router(app.state.clone()).merge(health::router(
        app.db_pool.clone(),
        app.state.bridge.as_ref().map(|bridge| bridge.status().clone()),
    ));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "vendaflow-server listening"
    );

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "vendaflow-server stopping"
    );
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(serve_error))) => tracing::error!(
            event_name = "system.server.error",
            correlation_id = "shutdown",
            error = %serve_error,
            "http server terminated with an error"
        ),
        Ok(Err(join_error)) => tracing::error!(
            event_name = "system.server.error",
            correlation_id = "shutdown",
            error = %join_error,
            "http server task failed"
        ),
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the grace period"
        ),
    }

    if let Some(task) = bridge_task {
        task.abort();
    }
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
