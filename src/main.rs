//! Whisper Bot - webhook ingestion server
//!
//! Receives Telegram updates over HTTP and processes them on a worker pool.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whisper_bot::api::{create_router, AppState};
use whisper_bot::{spawn_sweep_task, Config};

/// Main entry point for the webhook server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build caches, dispatcher and worker pool
/// 4. Start workers and the optional expiry sweep
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Drain the queue before exiting
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whisper_bot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Whisper Bot webhook server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        workers = config.worker_count,
        queue_capacity = ?config.queue_capacity,
        inline_cache_capacity = config.inline_cache_capacity,
        inline_cache_ttl = config.inline_cache_ttl,
        photo_cache_capacity = config.photo_cache_capacity,
        sweep_interval = config.sweep_interval,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("invalid cache configuration")?;

    state
        .pool
        .start(config.worker_count, state.dispatcher.clone())
        .context("failed to start worker pool")?;

    let sweep_token = CancellationToken::new();
    let sweep_handle = config.sweep_period().map(|period| {
        spawn_sweep_task(
            state.dispatcher.inline_cache().clone(),
            period,
            sweep_token.clone(),
        )
    });

    let pool = state.pool.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Webhook is closed; let workers finish what Telegram already handed us
    pool.shutdown().await;

    sweep_token.cancel();
    if let Some(handle) = sweep_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Expiry sweep task ended abnormally");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
