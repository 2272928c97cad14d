//! Voyage API server
//!
//! An HTTP front end for the travel orchestrator: chat turns, session
//! reset and inspection, model selection, traces and usage.

pub mod api;
pub mod state;

pub use api::{ApiError, build_router};
pub use state::AppState;
