//! Conversation sessions
//!
//! A [`Session`] is one user's conversation: the ordered turns, the state tag
//! of the planning state machine, the trip request being gathered, the last
//! search results and the current itinerary.

use crate::agents::search::{SearchQuery, SearchResults};
use crate::intent::{IntentResult, MissingField};
use crate::itinerary::Itinerary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use voyage_common::{HISTORY_SNIPPET_CHARS, HISTORY_WINDOW, truncate_chars};

/// Where a session is in the planning flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Greeting,
    GatheringInfo,
    Searching,
    Planning,
    Reviewing,
    Modifying,
    Confirmed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Greeting => "greeting",
            SessionState::GatheringInfo => "gathering_info",
            SessionState::Searching => "searching",
            SessionState::Planning => "planning",
            SessionState::Reviewing => "reviewing",
            SessionState::Modifying => "modifying",
            SessionState::Confirmed => "confirmed",
        }
    }

    /// States that only make sense with an itinerary in hand
    pub fn requires_itinerary(&self) -> bool {
        matches!(
            self,
            SessionState::Reviewing | SessionState::Modifying | SessionState::Confirmed
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == SessionState::Confirmed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

/// One message of the conversation; never edited after it is appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Render the tail of a conversation for a prompt
pub fn history_excerpt(turns: &[Turn]) -> String {
    let start = turns.len().saturating_sub(HISTORY_WINDOW);
    turns[start..]
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), truncate_chars(&t.content, HISTORY_SNIPPET_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Constraints accumulated while gathering a trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub dates: Option<String>,
    pub budget: Option<String>,
    pub preferences: Vec<String>,
    /// The user messages that described this trip, oldest first
    pub messages: Vec<String>,
}

impl TripRequest {
    /// Fold a classified message into the request; newer values win
    pub fn merge_intent(&mut self, intent: &IntentResult, message: &str) {
        if let Some(destination) = &intent.destination {
            self.destination = Some(destination.clone());
        }
        if let Some(origin) = &intent.origin {
            self.origin = Some(origin.clone());
        }
        if let Some(dates) = &intent.dates {
            self.dates = Some(dates.clone());
        }
        if let Some(budget) = &intent.budget {
            self.budget = Some(budget.clone());
        }
        for preference in &intent.preferences {
            if !self.preferences.iter().any(|p| p.eq_ignore_ascii_case(preference)) {
                self.preferences.push(preference.clone());
            }
        }
        let message = message.trim();
        if !message.is_empty() {
            self.messages.push(message.to_string());
        }
    }

    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.destination.is_none() {
            missing.push(MissingField::Destination);
        }
        if self.dates.is_none() {
            missing.push(MissingField::TravelDates);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.dates.is_some()
    }

    /// The request as the user phrased it, followed by the known constraints
    pub fn describe(&self) -> String {
        let mut out = self.messages.join("\n");
        let mut known = Vec::new();
        if let Some(destination) = &self.destination {
            known.push(format!("- Destination: {}", destination));
        }
        if let Some(origin) = &self.origin {
            known.push(format!("- Origin: {}", origin));
        }
        if let Some(dates) = &self.dates {
            known.push(format!("- Dates: {}", dates));
        }
        if let Some(budget) = &self.budget {
            known.push(format!("- Budget: {}", budget));
        }
        if !self.preferences.is_empty() {
            known.push(format!("- Preferences: {}", self.preferences.join(", ")));
        }
        if !known.is_empty() {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str("Known details:\n");
            out.push_str(&known.join("\n"));
        }
        out
    }

    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            dates: self.dates.clone(),
            preferences: self.preferences.clone(),
        }
    }
}

/// The part of a session a failed turn rolls back
#[derive(Debug, Clone)]
pub struct SessionCheckpoint {
    state: SessionState,
    trip: TripRequest,
    itinerary: Option<Itinerary>,
    search_results: Option<SearchResults>,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub turns: Vec<Turn>,
    pub trip: TripRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Itinerary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
    state: SessionState,
    trip: TripRequest,
    itinerary: Option<Itinerary>,
    search_results: Option<SearchResults>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            state: SessionState::Greeting,
            trip: TripRequest::default(),
            itinerary: None,
            search_results: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn trip(&self) -> &TripRequest {
        &self.trip
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    pub fn search_results(&self) -> Option<&SearchResults> {
        self.search_results.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content.into());
    }

    fn push(&mut self, role: Role, content: String) {
        self.turns.push(Turn {
            role,
            content,
            timestamp: Utc::now(),
        });
    }

    /// `reviewing`, `modifying` and `confirmed` need an itinerary
    pub fn is_consistent(&self) -> bool {
        !self.state.requires_itinerary() || self.itinerary.is_some()
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn trip_mut(&mut self) -> &mut TripRequest {
        &mut self.trip
    }

    pub(crate) fn set_itinerary(&mut self, itinerary: Itinerary) {
        self.itinerary = Some(itinerary);
    }

    pub(crate) fn set_search_results(&mut self, results: SearchResults) {
        self.search_results = Some(results);
    }

    /// Start over with an empty trip request, dropping the previous plan
    pub(crate) fn begin_trip(&mut self) {
        self.trip = TripRequest::default();
        self.itinerary = None;
        self.search_results = None;
    }

    pub fn checkpoint(&self) -> SessionCheckpoint {
        SessionCheckpoint {
            state: self.state,
            trip: self.trip.clone(),
            itinerary: self.itinerary.clone(),
            search_results: self.search_results.clone(),
        }
    }

    /// Roll back everything except the turn history
    pub fn restore(&mut self, checkpoint: SessionCheckpoint) {
        self.state = checkpoint.state;
        self.trip = checkpoint.trip;
        self.itinerary = checkpoint.itinerary;
        self.search_results = checkpoint.search_results;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            state: self.state,
            turns: self.turns.clone(),
            trip: self.trip.clone(),
            itinerary: self.itinerary.clone(),
            created_at: self.created_at,
        }
    }
}
