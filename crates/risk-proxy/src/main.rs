mod cli;
mod config;
mod error;
mod logging;
mod routes;
mod upstream;

use crate::cli::Args;
use crate::config::{load_proxy_config, UpstreamSettings};
use crate::logging::init_tracing;
use crate::routes::{build_router, AppState};
use crate::upstream::build_http_client;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    info!(
        listen_addr = %args.listen_addr,
        config = ?args.config,
        "risk proxy starting"
    );
    let config = load_proxy_config(args.config.as_deref())?;
    let settings = UpstreamSettings::from_process_env(config);
    let missing = settings.missing();
    if !missing.is_empty() {
        // Read again on every request, so this is only a hint.
        tracing::warn!(missing = ?missing, "upstream settings not resolved at startup");
    }
    let http = build_http_client().context("failed to build http client")?;
    let app = build_router(AppState {
        http,
        settings: Arc::new(settings),
    });

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    let listener = TcpListener::bind(&args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    info!(addr = %args.listen_addr, "risk proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("risk proxy shutting down");
    Ok(())
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
}
