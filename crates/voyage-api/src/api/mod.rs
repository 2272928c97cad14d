//! HTTP routes
//!
//! Each submodule owns one area of the API and exposes its routes; this
//! module merges them and adds the shared layers.

pub mod chat;
pub mod models;
pub mod traces;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use voyage_common::{ServerConfig, VoyageError};

use crate::state::AppState;

/// A [`VoyageError`] rendered as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub VoyageError);

impl From<VoyageError> for ApiError {
    fn from(err: VoyageError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            VoyageError::UnknownModel { .. } | VoyageError::InvalidRequest(_) | VoyageError::Serde(_) => {
                StatusCode::BAD_REQUEST
            }
            VoyageError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            VoyageError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            VoyageError::Config(_) | VoyageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Handler for the root endpoint
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Voyage Travel Agent API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for the health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Build the full router with all routes and middleware
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(chat::chat_routes(state.clone()))
        .merge(models::model_routes(state.clone()))
        .merge(traces::trace_routes(state))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
