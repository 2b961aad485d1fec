//! HTTP API for the concierge.
//!
//! `POST /chat` runs one agent turn. Failures are rendered as an
//! `{error_kind, message}` envelope with a status matching the kind.

use crate::agent::Agent;
use crate::error::{ConciergeError, ErrorKind};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub agent: Agent,
    pub max_query_chars: usize,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_kind: String,
    pub message: String,
}

/// A [`ConciergeError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ConciergeError);

impl From<ConciergeError> for ApiError {
    fn from(err: ConciergeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let message = match kind {
            ErrorKind::BadRequest | ErrorKind::Validation => self.0.to_string(),
            ErrorKind::Timeout => {
                warn!("{}", self.0);
                "The assistant took too long to respond. Please try again.".to_string()
            }
            ErrorKind::Upstream => {
                error!("{}", self.0);
                "The language model service is unavailable right now. Please try again later."
                    .to_string()
            }
            ErrorKind::Internal => {
                error!("{}", self.0);
                "Something went wrong while answering. Please try again.".to_string()
            }
        };

        (
            Self::status(kind),
            Json(ErrorResponse {
                error_kind: kind.as_str().to_string(),
                message,
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "Campus Concierge",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /chat",
            "health": "GET /health"
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ConciergeError::BadRequest(e.body_text()))?;

    let query = req.query.trim();
    if query.is_empty() {
        return Err(ConciergeError::BadRequest("query must not be empty".to_string()).into());
    }
    let length = query.chars().count();
    if length > state.max_query_chars {
        return Err(ConciergeError::BadRequest(format!(
            "query is {} characters long (limit {})",
            length, state.max_query_chars
        ))
        .into());
    }

    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConciergeError::BadRequest("session_id is required".to_string()))?;

    let response = state.agent.answer(query, session_id).await?;

    Ok(Json(ChatResponse {
        answer: response.answer,
    }))
}
