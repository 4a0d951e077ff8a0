//! Axum HTTP surface: routing table and server bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::pipeline::RelayState;

mod endpoints;
mod handlers;

use endpoints::{
    AUTHORIZE_ENDPOINT, ERROR_ENDPOINT, INTERACTIVE_ENDPOINT, OPTIONS_LOAD_ENDPOINT,
    REDIRECT_URI_ENDPOINT, TEST_ENDPOINT,
};
use handlers::{
    handle_authorize, handle_error_demo, handle_interactive, handle_not_found,
    handle_options_load, handle_redirect_uri, handle_test,
};

pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route(TEST_ENDPOINT, get(handle_test))
        .route(ERROR_ENDPOINT, get(handle_error_demo))
        .route(AUTHORIZE_ENDPOINT, get(handle_authorize))
        .route(REDIRECT_URI_ENDPOINT, get(handle_redirect_uri))
        .route(INTERACTIVE_ENDPOINT, post(handle_interactive))
        .route(OPTIONS_LOAD_ENDPOINT, post(handle_options_load))
        .fallback(handle_not_found)
        .with_state(state)
}

/// Binds and serves the gateway until ctrl-c.
pub async fn run_http_server(bind: &str, state: Arc<RelayState>) -> anyhow::Result<()> {
    let bind_addr = bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{bind}'"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound gateway address")?;
    tracing::info!(%local_addr, "triage relay gateway listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("gateway server exited unexpectedly")
}
