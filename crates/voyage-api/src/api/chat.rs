use axum::{
    Router,
    extract::{Json, Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use voyage_common::{DEFAULT_SESSION_ID, VoyageError};
use voyage_core::{Itinerary, SessionSnapshot, SessionState};

use crate::api::ApiError;
use crate::state::AppState;

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Itinerary>,
}

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

/// Handler for one chat turn.
/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(VoyageError::InvalidRequest("message must not be empty".to_string()).into());
    }

    let outcome = state.chat(&request.session_id, message).await;
    Ok(Json(ChatResponse {
        response: outcome.response,
        session_id: request.session_id,
        state: outcome.state,
        itinerary: outcome.itinerary,
    }))
}

/// Handler to drop a session's conversation.
/// POST /api/reset?session_id=...
pub async fn reset(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Result<Json<Value>, ApiError> {
    state.reset(&params.session_id).await?;
    Ok(Json(json!({ "status": "success", "message": "Session reset" })))
}

/// Handler to list known session identifiers.
/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sessions": state.sessions.session_ids().await }))
}

/// Handler to inspect a session.
/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// Register chat and session routes under /api
pub fn chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/reset", post(reset))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        .with_state(state)
}
