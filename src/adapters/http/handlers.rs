//! HTTP handlers for the configurator endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::application::{Orchestrator, TurnRequest};
use crate::domain::foundation::SessionId;
use crate::domain::messages::LanguageTag;

use super::dto::{ErrorResponse, MessageRequest, MessageResponse};

/// Component readiness flags reported by `GET /health`.
#[derive(Debug, Clone, Default)]
pub struct Readiness {
    pub llm: bool,
    pub graph: bool,
    pub cache: bool,
    pub archive: bool,
}

/// Shared state for the configurator routes.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub readiness: Readiness,
}

/// POST /configurator/message - one conversational turn.
///
/// Domain-level failures (extraction, search, thresholds) are normal 200
/// responses with a user-facing message; only infrastructure failures reach
/// HTTP error status.
pub async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session_id = match &request.session_id {
        Some(raw) => Some(
            raw.parse::<SessionId>()
                .map_err(|_| ApiError::BadRequest("invalid session_id".to_string()))?,
        ),
        None => None,
    };

    let mut turn = TurnRequest::new(request.message);
    if let Some(id) = session_id {
        turn = turn.with_session(id);
    }
    if let Some(language) = &request.language {
        turn = turn.with_language(LanguageTag::parse_or_default(language));
    }
    if request.reset {
        turn = turn.with_reset();
    }

    let response = state.orchestrator.handle_message(turn).await.map_err(|err| {
        error!(error = %err, "turn failed");
        ApiError::Internal
    })?;

    Ok(Json(MessageResponse::from(response)))
}

/// GET /health - component readiness booleans.
pub async fn health(State(state): State<AppState>) -> Json<BTreeMap<&'static str, bool>> {
    let mut components = BTreeMap::new();
    components.insert("llm", state.readiness.llm);
    components.insert("graph", state.readiness.graph);
    components.insert("cache", state.readiness.cache);
    components.insert("archive", state.readiness.archive);
    components.insert("orchestrator", true);
    Json(components)
}

/// API-level errors; internal details never reach the client.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
