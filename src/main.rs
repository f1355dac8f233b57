use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;

use rusty_tally::config::Config;
use rusty_tally::logging::init_logging;
use rusty_tally::rate_limit::RateLimiter;
use rusty_tally::{api, Engine};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.log_format);

    let engine = Arc::new(Engine::new());
    let pruner = spawn_pruner(&config, Arc::clone(&engine));

    let router = api::create_router(
        Arc::clone(&engine),
        RateLimiter::per_minute(config.rate_limit_per_minute),
    );
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    tracing::info!(
        %addr,
        rate_limit_per_minute = config.rate_limit_per_minute,
        retention_secs = ?config.retention_secs,
        "rusty-tally listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(pruner) = pruner {
        pruner.abort();
    }
    tracing::info!("rusty-tally stopped");
    Ok(())
}

/// Periodically evicts transactions older than the configured retention.
fn spawn_pruner(config: &Config, engine: Arc<Engine>) -> Option<JoinHandle<()>> {
    let retention = config.retention()?;
    let period = config.prune_interval();
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            engine.prune_expired(retention);
        }
    }))
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}
