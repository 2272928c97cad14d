//! Travel orchestrator
//!
//! Runs one conversation turn: classify the message, pick the capability
//! the session state and intent call for, move the state machine, and
//! answer. A turn that fails part-way is rolled back and answered with an
//! apology, so the history always alternates user and assistant turns.

use crate::agents::{Capabilities, PlanRequest, ResponseRequest};
use crate::context::TurnContext;
use crate::intent::{IntentKind, IntentResult};
use crate::itinerary::Itinerary;
use crate::models::ModelClientConfig;
use crate::session::{Session, SessionState};
use crate::usage::{RunStatus, UsageTracker};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use voyage_common::{Result, TURN_TRACE_NAME, VoyageError};

pub const APOLOGY_RESPONSE: &str =
    "I'm sorry, something went wrong while working on your trip. Please try again in a moment.";
pub const REJECTION_RESPONSE: &str = "I understand. Let me know what specific changes you'd like to make, or if you'd prefer to start fresh with different options.";
pub const NO_TRIP_RESPONSE: &str = "Great! What trip would you like to plan?";
const REVIEW_PROMPT: &str = "Would you like me to modify anything in this plan? Feel free to share your feedback!";
const REVISED_PROMPT: &str = "I've updated the itinerary based on your feedback. What do you think?";

/// Result of one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    /// `None` when the turn failed before classification finished
    pub intent: Option<IntentKind>,
    pub state: SessionState,
    /// States visited during the turn, starting with the state it began in
    pub transitions: Vec<SessionState>,
    pub itinerary: Option<Itinerary>,
    pub error: Option<String>,
}

/// What happened so far in a running turn
struct TurnLog {
    intent: Option<IntentKind>,
    transitions: Vec<SessionState>,
}

impl TurnLog {
    fn new(initial: SessionState) -> Self {
        Self {
            intent: None,
            transitions: vec![initial],
        }
    }

    fn enter(&mut self, session: &mut Session, state: SessionState) {
        session.set_state(state);
        if self.transitions.last() != Some(&state) {
            self.transitions.push(state);
        }
    }
}

/// A `new_trip` while gathering keeps the pending request unless it names
/// another destination
fn continues_pending_trip(session: &Session, intent: &IntentResult) -> bool {
    if session.state() != SessionState::GatheringInfo {
        return false;
    }
    match (intent.destination.as_deref(), session.trip().destination.as_deref()) {
        (None, _) | (_, None) => true,
        (Some(named), Some(pending)) => named.trim().eq_ignore_ascii_case(pending.trim()),
    }
}

pub struct TravelOrchestrator {
    capabilities: Capabilities,
    tracker: Arc<UsageTracker>,
}

impl TravelOrchestrator {
    pub fn new(capabilities: Capabilities, tracker: Arc<UsageTracker>) -> Self {
        Self { capabilities, tracker }
    }

    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    /// Process one user message against `session` using `model` for every call
    pub async fn handle_message(
        &self,
        session: &mut Session,
        message: &str,
        model: ModelClientConfig,
    ) -> TurnOutcome {
        let trace = self.tracker.start_trace(TURN_TRACE_NAME, session.id()).await;
        let ctx = TurnContext::new(session.id(), model, trace);

        session.push_user(message);
        let checkpoint = session.checkpoint();
        let mut log = TurnLog::new(session.state());

        let (response, error) = match self.run_turn(&ctx, session, message, &mut log).await {
            Ok(response) => {
                ctx.trace.finish(RunStatus::Success).await;
                (response, None)
            }
            Err(err) => {
                error!(
                    "Turn failed for session {} (trace {}): {}",
                    ctx.session_id,
                    ctx.trace.trace_id(),
                    err
                );
                session.restore(checkpoint);
                log.transitions.truncate(1);
                ctx.trace.finish(RunStatus::Error).await;
                (APOLOGY_RESPONSE.to_string(), Some(err.to_string()))
            }
        };

        session.push_assistant(response.clone());
        debug_assert!(session.is_consistent(), "session {} left inconsistent", session.id());
        info!(
            "Session {} turn done: intent={:?} state={}",
            session.id(),
            log.intent,
            session.state()
        );

        TurnOutcome {
            response,
            intent: log.intent,
            state: session.state(),
            transitions: log.transitions,
            itinerary: session.itinerary().cloned(),
            error,
        }
    }

    async fn run_turn(
        &self,
        ctx: &TurnContext,
        session: &mut Session,
        message: &str,
        log: &mut TurnLog,
    ) -> Result<String> {
        let intent = self.capabilities.classifier.classify(ctx, session, message).await?;
        log.intent = Some(intent.kind);

        let gathering_details = session.state() == SessionState::GatheringInfo
            && intent.provides_trip_details()
            && !matches!(intent.kind, IntentKind::AskQuestion | IntentKind::Reject);

        match intent.kind {
            IntentKind::NewTrip => {
                if !continues_pending_trip(session, &intent) {
                    session.begin_trip();
                }
                self.gather_or_plan(ctx, session, message, &intent, log).await
            }
            _ if gathering_details => self.gather_or_plan(ctx, session, message, &intent, log).await,
            IntentKind::ModifyTrip => {
                if session.itinerary().is_some() {
                    let feedback = intent.feedback.as_deref().unwrap_or(message);
                    self.revise(ctx, session, feedback, log).await
                } else {
                    session.begin_trip();
                    self.gather_or_plan(ctx, session, message, &intent, log).await
                }
            }
            IntentKind::AskQuestion => {
                let request = ResponseRequest::Answer {
                    question: message,
                    itinerary: session.itinerary(),
                    search: session.search_results(),
                    history: session.turns(),
                };
                self.capabilities.responder.respond(ctx, request).await
            }
            IntentKind::Confirm => self.confirm(ctx, session, log).await,
            IntentKind::Reject => Ok(REJECTION_RESPONSE.to_string()),
            IntentKind::Unclear => {
                if session.itinerary().is_some() && session.state() == SessionState::Reviewing {
                    return self.revise(ctx, session, message, log).await;
                }
                let request = ResponseRequest::General {
                    message,
                    state: session.state(),
                    itinerary: session.itinerary(),
                    history: session.turns(),
                };
                let response = self.capabilities.responder.respond(ctx, request).await?;
                if session.itinerary().is_none() {
                    log.enter(session, SessionState::Greeting);
                }
                Ok(response)
            }
        }
    }

    /// Merge what the message told us, then either ask for the rest or plan
    async fn gather_or_plan(
        &self,
        ctx: &TurnContext,
        session: &mut Session,
        message: &str,
        intent: &IntentResult,
        log: &mut TurnLog,
    ) -> Result<String> {
        session.trip_mut().merge_intent(intent, message);
        let missing = session.trip().missing_fields();
        if missing.is_empty() {
            return self.plan_trip(ctx, session, log).await;
        }

        let request = session.trip().describe();
        let questions = self
            .capabilities
            .responder
            .respond(ctx, ResponseRequest::Clarify { request: &request, missing: &missing })
            .await?;
        log.enter(session, SessionState::GatheringInfo);
        Ok(format!("I'd love to help you plan your trip! {}", questions))
    }

    async fn plan_trip(&self, ctx: &TurnContext, session: &mut Session, log: &mut TurnLog) -> Result<String> {
        log.enter(session, SessionState::Searching);
        let query = session.trip().search_query();
        let results = self.capabilities.searcher.search(ctx, &query).await?;

        log.enter(session, SessionState::Planning);
        let itinerary = self
            .capabilities
            .planner
            .plan(ctx, PlanRequest::Create { trip: session.trip(), search: &results })
            .await?;
        let intro = self
            .capabilities
            .responder
            .respond(ctx, ResponseRequest::PresentItinerary { itinerary: &itinerary, revised: false })
            .await?;

        let response = format!("{}\n\n{}\n\n{}", intro, itinerary.to_markdown(), REVIEW_PROMPT);
        session.set_search_results(results);
        session.set_itinerary(itinerary);
        log.enter(session, SessionState::Reviewing);
        Ok(response)
    }

    async fn revise(
        &self,
        ctx: &TurnContext,
        session: &mut Session,
        feedback: &str,
        log: &mut TurnLog,
    ) -> Result<String> {
        log.enter(session, SessionState::Modifying);
        let Some(current) = session.itinerary() else {
            return Err(VoyageError::InvalidRequest("no itinerary to modify".to_string()));
        };
        let request = PlanRequest::Revise {
            current,
            feedback,
            history: session.turns(),
        };
        let itinerary = self.capabilities.planner.plan(ctx, request).await?;
        let intro = self
            .capabilities
            .responder
            .respond(ctx, ResponseRequest::PresentItinerary { itinerary: &itinerary, revised: true })
            .await?;

        let response = format!("{}\n\n{}\n\n{}", intro, itinerary.to_markdown(), REVISED_PROMPT);
        session.set_itinerary(itinerary);
        log.enter(session, SessionState::Reviewing);
        Ok(response)
    }

    async fn confirm(&self, ctx: &TurnContext, session: &mut Session, log: &mut TurnLog) -> Result<String> {
        let Some(itinerary) = session.itinerary() else {
            return Ok(NO_TRIP_RESPONSE.to_string());
        };
        let summary = self
            .capabilities
            .responder
            .respond(ctx, ResponseRequest::Summarize { itinerary })
            .await?;
        let response = format!(
            "Excellent! Your trip to {} ({}) is all set!\n\n{}\n\nHave a wonderful trip! Feel free to come back if you need any changes or want to plan another adventure.",
            itinerary.destination,
            itinerary.dates.describe(),
            summary
        );
        log.enter(session, SessionState::Confirmed);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{IntentClassifier, ItineraryPlanner, Responder, SearchQuery, SearchResults, TripSearcher};
    use crate::itinerary::fixtures::sample_itinerary;
    use crate::models::ModelProvider;
    use crate::session::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Pops scripted intents in order
    struct ScriptedClassifier(Mutex<VecDeque<Result<IntentResult>>>);

    #[async_trait]
    impl IntentClassifier for ScriptedClassifier {
        async fn classify(&self, _ctx: &TurnContext, _session: &Session, _message: &str) -> Result<IntentResult> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(IntentResult::unclear()))
        }
    }

    #[derive(Default)]
    struct FakeSearcher {
        fail: bool,
        queries: Mutex<Vec<SearchQuery>>,
    }

    #[async_trait]
    impl TripSearcher for FakeSearcher {
        async fn search(&self, _ctx: &TurnContext, query: &SearchQuery) -> Result<SearchResults> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(VoyageError::upstream("serper", "503 Service Unavailable"));
            }
            Ok(SearchResults::default())
        }
    }

    /// Creates an itinerary with as many days as the dates say, defaulting to 5;
    /// revisions drop to 3 days
    #[derive(Default)]
    struct FakePlanner {
        revisions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ItineraryPlanner for FakePlanner {
        async fn plan(&self, _ctx: &TurnContext, request: PlanRequest<'_>) -> Result<Itinerary> {
            match request {
                PlanRequest::Create { trip, .. } => {
                    let destination = trip.destination.clone().unwrap_or_default();
                    Ok(sample_itinerary(&destination, 5))
                }
                PlanRequest::Revise { current, feedback, .. } => {
                    self.revisions.lock().unwrap().push(feedback.to_string());
                    Ok(sample_itinerary(&current.destination, 3))
                }
            }
        }
    }

    struct EchoResponder;

    #[async_trait]
    impl Responder for EchoResponder {
        async fn respond(&self, _ctx: &TurnContext, request: ResponseRequest<'_>) -> Result<String> {
            Ok(match request {
                ResponseRequest::Clarify { missing, .. } => format!("What about your {}?", missing[0]),
                ResponseRequest::PresentItinerary { itinerary, .. } => format!("Here is {}!", itinerary.destination),
                ResponseRequest::Answer { question, .. } => format!("Answer to: {}", question),
                ResponseRequest::Summarize { itinerary } => format!("{} days of fun.", itinerary.num_days()),
                ResponseRequest::General { .. } => "How can I help?".to_string(),
            })
        }
    }

    struct Harness {
        orchestrator: TravelOrchestrator,
        searcher: Arc<FakeSearcher>,
        planner: Arc<FakePlanner>,
        session: Session,
    }

    impl Harness {
        fn new(intents: Vec<IntentResult>) -> Self {
            Self::with_searcher(intents, FakeSearcher::default())
        }

        fn with_searcher(intents: Vec<IntentResult>, searcher: FakeSearcher) -> Self {
            let searcher = Arc::new(searcher);
            let planner = Arc::new(FakePlanner::default());
            let capabilities = Capabilities {
                classifier: Arc::new(ScriptedClassifier(Mutex::new(intents.into_iter().map(Ok).collect()))),
                searcher: searcher.clone(),
                planner: planner.clone(),
                responder: Arc::new(EchoResponder),
            };
            Self {
                orchestrator: TravelOrchestrator::new(capabilities, UsageTracker::new(20)),
                searcher,
                planner,
                session: Session::new("test"),
            }
        }

        async fn send(&mut self, message: &str) -> TurnOutcome {
            let model = ModelProvider::default().default_model();
            self.orchestrator.handle_message(&mut self.session, message, model).await
        }
    }

    fn paris() -> IntentResult {
        IntentResult::new(IntentKind::NewTrip)
            .with_destination("Paris")
            .with_dates("April")
    }

    #[tokio::test]
    async fn test_complete_new_trip_plans_immediately() {
        let mut harness = Harness::new(vec![paris()]);
        let outcome = harness.send("Plan a 5-day trip to Paris in April").await;

        assert_eq!(outcome.intent, Some(IntentKind::NewTrip));
        assert_eq!(
            outcome.transitions,
            vec![
                SessionState::Greeting,
                SessionState::Searching,
                SessionState::Planning,
                SessionState::Reviewing
            ]
        );
        assert_eq!(outcome.state, SessionState::Reviewing);
        assert!(outcome.response.contains("Paris"));
        for day in 1..=5 {
            assert!(outcome.response.contains(&format!("Day {}", day)));
        }
        assert!(outcome.response.ends_with(REVIEW_PROMPT));
        assert!(outcome.error.is_none());
        assert_eq!(outcome.itinerary.unwrap().num_days(), 5);
        assert_eq!(harness.searcher.queries.lock().unwrap()[0].destination.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_incomplete_trip_gathers_then_plans() {
        let mut harness = Harness::new(vec![
            IntentResult::new(IntentKind::NewTrip).with_destination("Lisbon"),
            IntentResult::unclear().with_dates("next May"),
        ]);

        let first = harness.send("I want to go to Lisbon").await;
        assert_eq!(first.state, SessionState::GatheringInfo);
        assert_eq!(first.transitions, vec![SessionState::Greeting, SessionState::GatheringInfo]);
        assert_eq!(first.response, "I'd love to help you plan your trip! What about your travel dates?");
        assert!(first.itinerary.is_none());

        let second = harness.send("next May").await;
        assert_eq!(second.state, SessionState::Reviewing);
        assert_eq!(second.transitions[0], SessionState::GatheringInfo);
        assert!(second.response.contains("Lisbon"));
        assert_eq!(harness.session.trip().messages, vec!["I want to go to Lisbon", "next May"]);
    }

    #[tokio::test]
    async fn test_new_trip_while_gathering_keeps_pending_details() {
        let mut harness = Harness::new(vec![
            IntentResult::new(IntentKind::NewTrip).with_destination("Lisbon"),
            IntentResult::new(IntentKind::NewTrip).with_dates("next May"),
        ]);

        let first = harness.send("I want to go to Lisbon").await;
        assert_eq!(first.state, SessionState::GatheringInfo);

        let second = harness.send("next May, for a week").await;
        assert_eq!(second.state, SessionState::Reviewing);
        assert!(second.response.contains("Lisbon"));
        assert_eq!(harness.session.trip().destination.as_deref(), Some("Lisbon"));
        assert_eq!(harness.session.trip().dates.as_deref(), Some("next May"));
    }

    #[tokio::test]
    async fn test_new_destination_while_gathering_starts_over() {
        let mut harness = Harness::new(vec![
            IntentResult {
                budget: Some("2000 EUR".to_string()),
                ..IntentResult::new(IntentKind::NewTrip).with_destination("Lisbon")
            },
            IntentResult::new(IntentKind::NewTrip).with_destination("Porto"),
        ]);
        harness.send("I want to go to Lisbon on 2000 EUR").await;

        let second = harness.send("Actually, make it Porto").await;
        assert_eq!(second.state, SessionState::GatheringInfo);
        assert_eq!(harness.session.trip().destination.as_deref(), Some("Porto"));
        assert!(harness.session.trip().budget.is_none());
        assert_eq!(harness.session.trip().messages, vec!["Actually, make it Porto"]);
    }

    #[tokio::test]
    async fn test_modify_then_confirm() {
        let mut harness = Harness::new(vec![
            paris(),
            IntentResult::new(IntentKind::ModifyTrip).with_feedback("shorter please"),
            IntentResult::new(IntentKind::Confirm),
        ]);
        harness.send("Plan a 5-day trip to Paris in April").await;

        let modified = harness.send("Can you make it shorter?").await;
        assert_eq!(
            modified.transitions,
            vec![SessionState::Reviewing, SessionState::Modifying, SessionState::Reviewing]
        );
        assert!(modified.response.ends_with(REVISED_PROMPT));
        assert_eq!(modified.itinerary.unwrap().num_days(), 3);
        assert_eq!(*harness.planner.revisions.lock().unwrap(), vec!["shorter please"]);

        let confirmed = harness.send("Looks great, book it").await;
        assert_eq!(confirmed.state, SessionState::Confirmed);
        assert!(confirmed.response.contains("Paris"));
        assert!(confirmed.response.contains("April"));
        assert!(confirmed.response.contains("3 days of fun."));
        assert!(harness.session.is_consistent());
    }

    #[tokio::test]
    async fn test_unclear_while_reviewing_is_treated_as_feedback() {
        let mut harness = Harness::new(vec![paris(), IntentResult::unclear()]);
        harness.send("Plan a 5-day trip to Paris in April").await;

        let outcome = harness.send("more food stuff").await;
        assert_eq!(outcome.state, SessionState::Reviewing);
        assert!(outcome.transitions.contains(&SessionState::Modifying));
        assert_eq!(*harness.planner.revisions.lock().unwrap(), vec!["more food stuff"]);
    }

    #[tokio::test]
    async fn test_unclear_without_itinerary_returns_to_greeting() {
        let mut harness = Harness::new(vec![
            IntentResult::new(IntentKind::NewTrip).with_destination("Rome"),
            IntentResult::unclear(),
        ]);
        harness.send("Rome!").await;
        assert_eq!(harness.session.state(), SessionState::GatheringInfo);

        let outcome = harness.send("blah").await;
        assert_eq!(outcome.response, "How can I help?");
        assert_eq!(outcome.state, SessionState::Greeting);
    }

    #[tokio::test]
    async fn test_confirm_and_modify_without_itinerary() {
        let mut harness = Harness::new(vec![
            IntentResult::new(IntentKind::Confirm),
            IntentResult::new(IntentKind::ModifyTrip).with_destination("Oslo"),
        ]);

        let confirm = harness.send("yes").await;
        assert_eq!(confirm.response, NO_TRIP_RESPONSE);
        assert_eq!(confirm.state, SessionState::Greeting);

        let modify = harness.send("change it to Oslo").await;
        assert_eq!(modify.state, SessionState::GatheringInfo);
    }

    #[tokio::test]
    async fn test_question_and_reject_keep_state() {
        let mut harness = Harness::new(vec![
            paris(),
            IntentResult::new(IntentKind::AskQuestion),
            IntentResult::new(IntentKind::Reject),
        ]);
        harness.send("Plan a 5-day trip to Paris in April").await;

        let question = harness.send("Is the Louvre open on Mondays?").await;
        assert_eq!(question.response, "Answer to: Is the Louvre open on Mondays?");
        assert_eq!(question.transitions, vec![SessionState::Reviewing]);

        let reject = harness.send("no").await;
        assert_eq!(reject.response, REJECTION_RESPONSE);
        assert_eq!(reject.state, SessionState::Reviewing);
    }

    #[tokio::test]
    async fn test_upstream_failure_rolls_back() {
        let mut harness = Harness::with_searcher(
            vec![paris()],
            FakeSearcher {
                fail: true,
                ..FakeSearcher::default()
            },
        );

        let outcome = harness.send("Plan a 5-day trip to Paris in April").await;
        assert_eq!(outcome.response, APOLOGY_RESPONSE);
        assert_eq!(outcome.state, SessionState::Greeting);
        assert_eq!(outcome.transitions, vec![SessionState::Greeting]);
        assert_eq!(outcome.intent, Some(IntentKind::NewTrip));
        assert!(outcome.error.unwrap().contains("503"));
        assert!(outcome.itinerary.is_none());
        assert_eq!(harness.session.trip().destination, None);

        let turns = harness.session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);

        let traces = harness.orchestrator.tracker().recent_traces(1).await;
        assert_eq!(traces[0].status, RunStatus::Error);
    }

    #[tokio::test]
    async fn test_new_trip_failure_restores_previous_itinerary() {
        let mut harness = Harness::new(vec![
            paris(),
            IntentResult::new(IntentKind::NewTrip)
                .with_destination("Tokyo")
                .with_dates("June"),
        ]);
        harness.send("Plan a 5-day trip to Paris in April").await;

        let failing: Arc<dyn TripSearcher> = Arc::new(FakeSearcher {
            fail: true,
            ..FakeSearcher::default()
        });
        harness.orchestrator.capabilities.searcher = failing;

        let outcome = harness.send("Actually, Tokyo in June").await;
        assert_eq!(outcome.response, APOLOGY_RESPONSE);
        assert_eq!(outcome.state, SessionState::Reviewing);
        assert_eq!(outcome.itinerary.unwrap().destination, "Paris");
        assert_eq!(harness.session.trip().destination.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_history_pairs_in_call_order() {
        let mut harness = Harness::new(vec![]);
        for i in 0..4 {
            harness.send(&format!("message {}", i)).await;
        }
        let turns = harness.session.turns();
        assert_eq!(turns.len(), 8);
        for (i, pair) in turns.chunks(2).enumerate() {
            assert_eq!(pair[0].content, format!("message {}", i));
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn test_turn_records_trace() {
        let mut harness = Harness::new(vec![paris()]);
        harness.send("Plan a 5-day trip to Paris in April").await;

        let traces = harness.orchestrator.tracker().recent_traces(5).await;
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].name, "travel_agent");
        assert_eq!(traces[0].session_id, "test");
        assert_eq!(traces[0].status, RunStatus::Success);
    }
}
