//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use voyage_common::{Result, VoyageConfig, VoyageError};
use voyage_core::llm::LLMService;
use voyage_core::{
    Capabilities, InMemorySessionStore, ModelProvider, ModelSelection, SessionStore, TravelOrchestrator,
    TurnOutcome, UsageTracker,
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TravelOrchestrator>,
    pub sessions: Arc<dyn SessionStore>,
    pub models: Arc<ModelSelection>,
    pub tracker: Arc<UsageTracker>,
}

impl AppState {
    /// Production state: LLM-backed agents and an in-memory session store
    pub fn from_config(config: &VoyageConfig) -> Result<Self> {
        let provider = ModelProvider::new(config.keys.clone());
        for entry in provider.entries() {
            if !provider.is_available(entry.key) {
                warn!("No API key configured for {}", entry.display_name);
            }
        }
        let models = ModelSelection::new(provider, config.initial_model.as_deref())?;

        let ai = Arc::new(LLMService::new(&config.keys));
        let capabilities = Capabilities::llm_backed(
            ai,
            &config.keys,
            Duration::from_secs(config.search_timeout_secs),
        )?;
        let tracker = UsageTracker::new(config.trace_capacity);

        Ok(Self::with_capabilities(capabilities, models, tracker))
    }

    pub fn with_capabilities(
        capabilities: Capabilities,
        models: ModelSelection,
        tracker: Arc<UsageTracker>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(TravelOrchestrator::new(capabilities, tracker.clone())),
            sessions: Arc::new(InMemorySessionStore::new()),
            models: Arc::new(models),
            tracker,
        }
    }

    /// Run one turn for `session_id`, creating the session if needed.
    ///
    /// The session stays locked for the whole turn, so messages to one
    /// session are handled one at a time.
    pub async fn chat(&self, session_id: &str, message: &str) -> TurnOutcome {
        let model = self.models.current().await;
        let session = self.sessions.get_or_create(session_id).await;
        let mut session = session.lock().await;
        info!("Chat turn for session {} using {}", session_id, model.display_name);
        self.orchestrator.handle_message(&mut session, message, model).await
    }

    /// Forget a session; unknown identifiers are not an error
    pub async fn reset(&self, session_id: &str) -> Result<()> {
        match self.sessions.remove(session_id).await {
            Ok(()) => {
                info!("Session {} reset", session_id);
                Ok(())
            }
            Err(VoyageError::SessionNotFound(id)) => {
                debug!("Reset of unknown session {} ignored", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
