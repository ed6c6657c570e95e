use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};
use tokio::net::TcpListener;
use tokio::signal;

use crate::check::Watcher;

pub async fn serve(address: SocketAddr, watcher: Arc<Watcher>) -> Result<()> {
    let router = Router::new()
        .route("/check", get(handle_check))
        .route("/healthz", get(|| async { "OK" }))
        .with_state(watcher);

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("listening at http://{address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn handle_check(State(watcher): State<Arc<Watcher>>) -> Response {
    match watcher.run_check().await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            error!("check failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "check failed").into_response()
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to listen for the shutdown signal: {err}");
    }
}
