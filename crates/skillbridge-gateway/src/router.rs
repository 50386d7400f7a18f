//! Request handlers.

use crate::backend::{BackendRootResponse, CountLettersResponse};
use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use skillbridge_agent::OrchestrationResult;
use skillbridge_core::CancellationToken;
use std::sync::Arc;
use tracing::info;

/// Body of both question endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn root_handler() -> &'static str {
    "skillbridge is running. POST a question to /countLetters-a2a."
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "skillbridge"}))
}

/// Relays the backend's root message.
pub async fn backend_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BackendRootResponse>, ApiError> {
    Ok(Json(state.backend.root().await?))
}

/// Plain question/answer against the backend, no tools involved.
pub async fn count_letters_handler(
    State(state): State<Arc<AppState>>,
    Json(ask): Json<AskRequest>,
) -> Result<Json<CountLettersResponse>, ApiError> {
    Ok(Json(state.backend.count_letters(&ask.question).await?))
}

/// Answers through the orchestrator with the remote agent's skills as tools.
pub async fn count_letters_a2a_handler(
    State(state): State<Arc<AppState>>,
    Json(ask): Json<AskRequest>,
) -> Result<Json<OrchestrationResult>, ApiError> {
    info!(question_len = ask.question.len(), "Orchestrated question received");
    // Dropping this future (client went away) cancels in-flight remote calls.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = state
        .orchestrator
        .ask_with_cancel(&ask.question, &cancel)
        .await?;
    Ok(Json(result))
}
