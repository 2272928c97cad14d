//! Agent capabilities
//!
//! The orchestrator depends on four narrow capabilities rather than on
//! concrete agents. The LLM-backed implementations are [`CommunicationAgent`]
//! (classification and user-facing text), [`SearchAgent`] and
//! [`PlannerAgent`]; tests substitute scripted ones.

pub mod communication;
pub mod planner;
pub mod search;

pub use communication::CommunicationAgent;
pub use planner::PlannerAgent;
pub use search::{SearchAgent, SearchCategory, SearchQuery, SearchResults, SearchSection};

use crate::context::TurnContext;
use crate::intent::{IntentResult, MissingField};
use crate::itinerary::Itinerary;
use crate::llm::AiService;
use crate::session::{Session, SessionState, TripRequest, Turn};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use voyage_common::{ApiKeys, Result};

/// Decides what a user message is for
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Malformed model output yields `Unclear`; only transport failures error
    async fn classify(&self, ctx: &TurnContext, session: &Session, message: &str) -> Result<IntentResult>;
}

/// Gathers raw travel information for a trip
#[async_trait]
pub trait TripSearcher: Send + Sync {
    async fn search(&self, ctx: &TurnContext, query: &SearchQuery) -> Result<SearchResults>;
}

/// What the planner is asked to do
#[derive(Debug, Clone, Copy)]
pub enum PlanRequest<'a> {
    /// Build a fresh itinerary
    Create {
        trip: &'a TripRequest,
        search: &'a SearchResults,
    },
    /// Rework the current itinerary around user feedback
    Revise {
        current: &'a Itinerary,
        feedback: &'a str,
        history: &'a [Turn],
    },
}

/// Produces structured itineraries
#[async_trait]
pub trait ItineraryPlanner: Send + Sync {
    async fn plan(&self, ctx: &TurnContext, request: PlanRequest<'_>) -> Result<Itinerary>;
}

/// Kinds of user-facing text
#[derive(Debug, Clone, Copy)]
pub enum ResponseRequest<'a> {
    /// Ask for what the trip request still lacks
    Clarify {
        request: &'a str,
        missing: &'a [MissingField],
    },
    /// Short introduction placed above a rendered itinerary
    PresentItinerary { itinerary: &'a Itinerary, revised: bool },
    /// Answer a question using whatever context exists
    Answer {
        question: &'a str,
        itinerary: Option<&'a Itinerary>,
        search: Option<&'a SearchResults>,
        history: &'a [Turn],
    },
    /// A few sentences summing up a confirmed trip
    Summarize { itinerary: &'a Itinerary },
    /// Anything else
    General {
        message: &'a str,
        state: SessionState,
        itinerary: Option<&'a Itinerary>,
        history: &'a [Turn],
    },
}

/// Writes text for the user
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, ctx: &TurnContext, request: ResponseRequest<'_>) -> Result<String>;
}

/// The set of capabilities one orchestrator works with
#[derive(Clone)]
pub struct Capabilities {
    pub classifier: Arc<dyn IntentClassifier>,
    pub searcher: Arc<dyn TripSearcher>,
    pub planner: Arc<dyn ItineraryPlanner>,
    pub responder: Arc<dyn Responder>,
}

impl Capabilities {
    /// The production set: every capability talks to an LLM through `ai`
    pub fn llm_backed(ai: Arc<dyn AiService>, keys: &ApiKeys, search_timeout: Duration) -> Result<Self> {
        let communication = Arc::new(CommunicationAgent::new(ai.clone()));
        Ok(Self {
            classifier: communication.clone(),
            searcher: Arc::new(SearchAgent::new(keys.serper.as_deref(), search_timeout)?),
            planner: Arc::new(PlannerAgent::new(ai)),
            responder: communication,
        })
    }
}
