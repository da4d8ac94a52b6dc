//! Inbound HTTP surface.
//!
//! One text-submission endpoint plus small operational extras. Wire field
//! names (`mensaje`/`respuesta`/`error`) follow the deployment's existing
//! front ends, so this server is a drop-in replacement for them.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, instrument};

use crate::{classify::filter, interaction::chat_message, runtime::Runtime};

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The free-text user message.
    pub mensaje: String,
}

/// Successful response of `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub respuesta: String,
}

/// Compose the application router.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/top-assignees", get(top_assignees_handler))
        .route("/models", get(models_handler))
        .layer(CorsLayer::permissive())
        .with_state(runtime)
}

async fn health_handler() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn chat_handler(State(runtime): State<Runtime>, Json(request): Json<ChatRequest>) -> Response {
    // Empty input is rejected before any fetch happens.
    if request.mensaje.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Mensaje vacío" }))).into_response();
    }

    match chat_message::handle_chat_message(&request.mensaje, &runtime.tracker, &runtime.llm, &runtime.config).await {
        Ok(respuesta) => Json(ChatResponse { respuesta }).into_response(),
        Err(err) => {
            error!("Chat request failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Error al procesar el mensaje: {err}") })),
            )
                .into_response()
        }
    }
}

#[instrument(skip_all)]
async fn top_assignees_handler(State(runtime): State<Runtime>) -> Response {
    match filter::top_assignees(&runtime.tracker, &runtime.config).await {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(err) => {
            error!("Top assignees request failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": format!("Error: {err}") }))).into_response()
        }
    }
}

async fn models_handler(State(runtime): State<Runtime>) -> Response {
    Json(json!({
        "model": runtime.config.llm_model,
        "dialect": runtime.config.llm_dialect,
        "endpoint": runtime.config.llm_endpoint,
    }))
    .into_response()
}
