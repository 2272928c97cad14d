use axum::{
    Router,
    extract::{Json, Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use voyage_common::DEFAULT_TRACE_LIMIT;
use voyage_core::UsageSummary;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TraceParams {
    pub limit: Option<usize>,
}

/// Handler returning the most recent traces, oldest first.
/// GET /api/traces?limit=N
pub async fn list_traces(State(state): State<AppState>, Query(params): Query<TraceParams>) -> Json<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_TRACE_LIMIT);
    let traces = state.tracker.recent_traces(limit).await;
    Json(json!({ "count": traces.len(), "traces": traces }))
}

/// Handler dropping all recorded traces.
/// DELETE /api/traces
pub async fn clear_traces(State(state): State<AppState>) -> Json<Value> {
    state.tracker.clear().await;
    Json(json!({ "status": "success", "message": "Traces cleared" }))
}

/// Handler for token usage totals and cost estimates.
/// GET /api/usage
pub async fn usage(State(state): State<AppState>) -> Json<UsageSummary> {
    Json(state.tracker.summary().await)
}

pub fn trace_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/traces", get(list_traces).delete(clear_traces))
        .route("/api/usage", get(usage))
        .with_state(state)
}
