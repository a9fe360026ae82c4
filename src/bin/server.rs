//! Vaultrade server binary: loads configuration, builds the application
//! context, and serves the HTTP/WebSocket surface (spec §6).
//!
//! # Exit codes
//! - `0` — graceful shutdown (Ctrl+C / SIGTERM)
//! - `1` — unrecoverable startup error (missing/invalid configuration,
//!   database unreachable, vault key malformed, listen address in use)

use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;
use vaultrade::application::bootstrap::AppContext;
use vaultrade::config::Config;
use vaultrade::interfaces::http;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "vaultrade server starting");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration failed to load");
            std::process::exit(1);
        }
    };
    let listen_addr = config.server.listen_addr.clone();

    let ctx = match AppContext::build(config).await {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!(error = %e, "application context failed to build");
            std::process::exit(1);
        }
    };

    let app = http::router(ctx);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %listen_addr, "failed to bind listen address");
            std::process::exit(1);
        }
    };
    info!(addr = %listen_addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
