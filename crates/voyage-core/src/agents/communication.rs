//! Communication agent
//!
//! Talks to the user: works out what a message is for and writes every
//! piece of user-facing text the orchestrator needs.

use crate::agents::{IntentClassifier, ResponseRequest, Responder};
use crate::context::TurnContext;
use crate::intent::IntentResult;
use crate::llm::{AiService, LlmRequest, generate_traced};
use crate::session::{Session, history_excerpt};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use voyage_common::{HISTORY_SNIPPET_CHARS, Result, agents, truncate_chars};

const ASSISTANT_PERSONA: &str = "You are a friendly and knowledgeable travel assistant. Your role is to help users plan their perfect trip.";

pub struct CommunicationAgent {
    ai: Arc<dyn AiService>,
}

impl CommunicationAgent {
    pub fn new(ai: Arc<dyn AiService>) -> Self {
        Self { ai }
    }

    async fn ask(&self, ctx: &TurnContext, action: &'static str, prompt: String) -> Result<String> {
        let request = LlmRequest::prompt(agents::COMMUNICATION, action, prompt);
        let completion = generate_traced(self.ai.as_ref(), ctx, request).await?;
        Ok(completion.content.trim().to_string())
    }

    fn intent_prompt(session: &Session, message: &str) -> String {
        let itinerary = match session.itinerary() {
            Some(itinerary) => format!("yes, for {}", itinerary.destination),
            None => "no".to_string(),
        };
        format!(
            r#"Analyze the following user message in the context of travel planning and determine the user's intent.

Conversation state: {state}
Itinerary already created: {itinerary}

User message: {message}

Return a JSON object with:
- intent: one of ["new_trip", "modify_trip", "ask_question", "confirm", "reject", "unclear"]
- destination: extracted destination if mentioned (null if not)
- origin: extracted departure city if mentioned (null if not)
- dates: extracted travel dates or duration if mentioned (null if not)
- budget: extracted budget if mentioned (null if not)
- preferences: list of extracted preferences (activities, pace, food, etc.)
- questions: any specific questions the user is asking
- feedback: specific feedback about a previous plan (null if not applicable)

Return only valid JSON without markdown formatting."#,
            state = session.state(),
        )
    }

    fn conversation_prompt(history: &str, context: &str) -> String {
        format!(
            r#"{ASSISTANT_PERSONA}

## Conversation History:
{history}

## Additional Context:
{context}

## Instructions:
1. Respond naturally and helpfully to the user's message
2. If they're starting a new trip, gather necessary information (destination, dates, budget, preferences)
3. If they have questions, answer them based on the context provided
4. If they provide feedback, acknowledge it and explain how it will be incorporated
5. Always be encouraging and helpful
6. Keep responses concise but informative

Generate your response:"#
        )
    }
}

#[async_trait]
impl IntentClassifier for CommunicationAgent {
    async fn classify(&self, ctx: &TurnContext, session: &Session, message: &str) -> Result<IntentResult> {
        let reply = self.ask(ctx, "analyze_intent", Self::intent_prompt(session, message)).await?;
        let intent = IntentResult::from_llm_reply(&reply);
        debug!("Classified message as {} (destination: {:?})", intent.kind, intent.destination);
        Ok(intent)
    }
}

#[async_trait]
impl Responder for CommunicationAgent {
    async fn respond(&self, ctx: &TurnContext, request: ResponseRequest<'_>) -> Result<String> {
        match request {
            ResponseRequest::Clarify { request, missing } => {
                let missing = missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                let prompt = format!(
                    r#"You are a friendly travel assistant. The user wants to plan a trip but some information is missing.

User request: {request}
Missing information: {missing}

Generate friendly, conversational questions to gather the missing information. Be concise and helpful.
Ask 2-3 questions maximum to avoid overwhelming the user."#
                );
                self.ask(ctx, "clarifying_questions", prompt).await
            }
            ResponseRequest::PresentItinerary { itinerary, revised } => {
                let content_type = if revised { "an updated itinerary" } else { "a new itinerary" };
                let overview = itinerary.overview.as_deref().unwrap_or("No overview provided");
                let prompt = format!(
                    r#"You are a friendly travel assistant presenting {content_type} to the user.
The full day-by-day plan is shown right after your text, so do not repeat it.

Destination: {destination}
Dates: {dates}
Length: {days} days
Overview: {overview}

Write a warm, engaging introduction of two or three sentences that highlights what makes this trip special."#,
                    destination = itinerary.destination,
                    dates = itinerary.dates.describe(),
                    days = itinerary.num_days(),
                );
                self.ask(ctx, "format_response", prompt).await
            }
            ResponseRequest::Answer {
                question,
                itinerary,
                search,
                history,
            } => {
                let context = format!(
                    "The user asked: {}\n\nCurrent itinerary: {}\n\nSearch results: {}",
                    question,
                    itinerary
                        .map(|i| i.to_markdown())
                        .unwrap_or_else(|| "No itinerary created yet".to_string()),
                    search
                        .map(|s| s.to_prompt_text())
                        .unwrap_or_else(|| "No searches performed yet".to_string()),
                );
                let prompt = Self::conversation_prompt(&history_excerpt(history), &context);
                self.ask(ctx, "generate_response", prompt).await
            }
            ResponseRequest::Summarize { itinerary } => {
                let prompt = format!(
                    r#"Create a brief, engaging summary of this travel itinerary in 3-4 sentences.
Highlight the destination, duration, and key highlights.

Itinerary:
{}"#,
                    itinerary.to_markdown()
                );
                self.ask(ctx, "summarize_trip", prompt).await
            }
            ResponseRequest::General {
                message,
                state,
                itinerary,
                history,
            } => {
                let context = format!(
                    "Latest message: {}\nCurrent state: {}\nCurrent itinerary: {}",
                    message,
                    state,
                    itinerary
                        .map(|i| truncate_chars(&i.to_markdown(), HISTORY_SNIPPET_CHARS))
                        .unwrap_or_else(|| "None".to_string()),
                );
                let prompt = Self::conversation_prompt(&history_excerpt(history), &context);
                self.ask(ctx, "generate_response", prompt).await
            }
        }
    }
}
