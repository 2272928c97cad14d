use axum::{
    Router,
    extract::{Json, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    pub model_display_name: String,
}

/// Handler listing the selectable models.
/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let current = state.models.current().await;
    Json(json!({
        "models": state.models.provider().list_display_names(),
        "current_model": current.display_name,
    }))
}

/// Handler switching the model used by turns that start from now on.
/// POST /api/models
pub async fn select_model(
    State(state): State<AppState>,
    Json(request): Json<SelectModelRequest>,
) -> Result<Json<Value>, ApiError> {
    let selected = state.models.select(&request.model_display_name).await?;
    info!("Model selected through API: {}", selected.display_name);
    Ok(Json(json!({
        "status": "success",
        "current_model": selected.display_name,
    })))
}

pub fn model_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/models", get(list_models).post(select_model))
        .with_state(state)
}
