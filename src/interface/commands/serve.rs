//! # Serve Command
//!
//! Binds the configured address and runs the HTTP/SSE server until it fails.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::application::orchestrator::Orchestrator;
use crate::interface::http;

pub async fn handle_serve(orchestrator: Arc<Orchestrator>, listen: &str) -> Result<()> {
    let app = http::router(orchestrator);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind server listener on {}", listen))?;
    tracing::info!("workflow-copilot listening on http://{}", listen);

    axum::serve(listener, app)
        .await
        .context("Server terminated with error")
}
