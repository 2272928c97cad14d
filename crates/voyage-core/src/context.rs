//! Per-turn call context

use crate::models::ModelClientConfig;
use crate::usage::TraceHandle;

/// Carried through every capability call of one turn.
///
/// The model is fixed when the turn starts; changing the selection while a
/// turn runs does not affect it.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    pub model: ModelClientConfig,
    pub trace: TraceHandle,
}

impl TurnContext {
    pub fn new(session_id: impl Into<String>, model: ModelClientConfig, trace: TraceHandle) -> Self {
        Self {
            session_id: session_id.into(),
            model,
            trace,
        }
    }
}
