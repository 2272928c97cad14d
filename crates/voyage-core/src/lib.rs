//! Voyage Core - conversational travel planning
//!
//! This crate provides the core functionality for Voyage, including:
//! - The model catalog and per-turn model selection
//! - Search, planner and communication agents behind capability traits
//! - Session state and the orchestrator that drives it
//! - Usage tracing for every LLM call

pub mod agents;
pub mod context;
pub mod intent;
pub mod itinerary;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod tools;
pub mod usage;

// Re-export key types for convenience
pub use agents::{
    Capabilities, CommunicationAgent, IntentClassifier, ItineraryPlanner, PlanRequest, PlannerAgent,
    Responder, ResponseRequest, SearchAgent, SearchQuery, SearchResults, TripSearcher,
};
pub use context::TurnContext;
pub use intent::{IntentKind, IntentResult, MissingField};
pub use itinerary::{Activity, BudgetEstimate, DayPlan, Itinerary, TravelDates};
pub use models::{AVAILABLE_MODELS, ModelClientConfig, ModelProvider, ModelSelection};
pub use orchestrator::{TravelOrchestrator, TurnOutcome};
pub use session::{Role, Session, SessionSnapshot, SessionState, TripRequest, Turn};
pub use store::{InMemorySessionStore, SessionStore, SharedSession};
pub use tools::AiTool;
pub use usage::{RunStatus, Span, Trace, TraceHandle, UsageSummary, UsageTracker};

/// The LLM service for interacting with AI models
pub mod llm;
