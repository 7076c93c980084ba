//! # HTTP Interface
//!
//! axum routes for the assistant endpoint, its SSE variant, and a health probe.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::application::orchestrator::Orchestrator;
use crate::domain::agent::{AgentEvent, AgentRequest, AgentResult};
use crate::domain::error::OrchestratorError;
use crate::strings::messages;

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/assistant", post(ask))
        .route("/api/assistant/stream", post(ask_stream))
        .with_state(AppState { orchestrator })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<AgentResult>, (StatusCode, Json<ErrorBody>)> {
    let Json(payload) = payload.map_err(map_rejection)?;
    let result = state
        .orchestrator
        .ask(payload)
        .await
        .map_err(map_orchestrator_error)?;
    Ok(Json(result))
}

async fn ask_stream(
    State(state): State<AppState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, (StatusCode, Json<ErrorBody>)> {
    let Json(payload) = payload.map_err(map_rejection)?;
    let events = state
        .orchestrator
        .clone()
        .ask_stream(payload)
        .map_err(map_orchestrator_error)?;

    let event_stream = events.map(|event| Ok(to_sse(&event)));

    Ok(Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keepalive"),
    ))
}

fn to_sse(event: &AgentEvent) -> SseEvent {
    if event.is_terminal() {
        tracing::debug!("Assistant stream finished with {} event", event.name());
    }
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    SseEvent::default().event(event.name()).data(payload)
}

fn map_rejection(rejection: JsonRejection) -> (StatusCode, Json<ErrorBody>) {
    tracing::debug!("Rejected assistant request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: messages::INVALID_PAYLOAD.to_string(),
        }),
    )
}

fn map_orchestrator_error(err: OrchestratorError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        OrchestratorError::EmptyQuestion => StatusCode::BAD_REQUEST,
        OrchestratorError::MissingCredential => StatusCode::UNAUTHORIZED,
        OrchestratorError::PlanParse(_) | OrchestratorError::ModelUnreachable(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    if err.is_input_error() {
        tracing::debug!("Rejected assistant request: {}", err);
    } else {
        tracing::warn!("Assistant request failed: {}", err);
    }
    (
        status,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
}
