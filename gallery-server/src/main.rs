//! Gallery API server.
//!
//! Environment:
//! - `PORT` (default 3001)
//! - `GALLERY_STORE` (`sqlite` or `memory`), `DATABASE_URL`
//! - `INSTAGRAM_ACCESS_TOKEN`, `INSTAGRAM_APP_ID`
//! - `LOG_FORMAT` (`pretty`, `json`, `compact`), `RUST_LOG`

use std::net::SocketAddr;

use anyhow::Context;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::GalleryConfigBuilder;
use core_service::GalleryService;
use gallery_server::{build_router, AppContext};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(logging_from_env()?)?;

    let config = GalleryConfigBuilder::from_env()?.build()?;
    let service = GalleryService::bootstrap(config)
        .await
        .context("Failed to initialize gallery service")?;

    let cancel = CancellationToken::new();
    let sweepers = service.start_maintenance(&cancel);

    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("Invalid PORT: {value}"))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Starting server on {addr}");

    let app = build_router(AppContext::new(service));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("Server error")?;

    cancel.cancel();
    for sweeper in sweepers {
        let _ = sweeper.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn logging_from_env() -> anyhow::Result<LoggingConfig> {
    let mut config = LoggingConfig::default();
    if let Ok(format) = std::env::var("LOG_FORMAT") {
        config = config.with_format(format.parse::<LogFormat>()?);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config = config.with_filter(filter);
    }
    Ok(config)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
