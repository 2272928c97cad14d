//! Planner agent: builds and revises itineraries

use crate::agents::{ItineraryPlanner, PlanRequest};
use crate::context::TurnContext;
use crate::itinerary::{Itinerary, TravelDates};
use crate::llm::{AiService, LlmRequest, generate_traced};
use crate::session::history_excerpt;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use voyage_common::{Result, agents};

const SYSTEM_PROMPT: &str = "You are an expert travel planner. You always answer with a single JSON object and nothing else.";

const ITINERARY_FORMAT: &str = r#"Return only a JSON object with this shape, without markdown formatting:
{
  "destination": "city or region",
  "dates": {"start": "YYYY-MM-DD or null", "end": "YYYY-MM-DD or null", "description": "the dates in words"},
  "overview": "two or three sentences about the trip",
  "days": [
    {"day": 1, "title": "short theme for the day",
     "activities": [{"time": "09:00", "description": "what to do, where, and how to get there", "estimated_cost": 25}]}
  ],
  "budget": {"total": 1500, "currency": "USD",
             "breakdown": [{"category": "Accommodation", "amount": 600}],
             "notes": "assumptions behind the estimate"},
  "tips": ["practical tip"]
}
Use one entry in "days" per day of the trip."#;

pub struct PlannerAgent {
    ai: Arc<dyn AiService>,
}

impl PlannerAgent {
    pub fn new(ai: Arc<dyn AiService>) -> Self {
        Self { ai }
    }

    fn create_prompt(request: &str, search_results: &str) -> String {
        format!(
            r#"Based on the user's request and the search results provided, create a detailed and optimized travel itinerary.

## User Request:
{request}

## Search Results:
{search_results}

## Instructions:
1. Create a day-by-day itinerary that is practical and well-organized
2. Include recommended flights and hotels based on the search results
3. Suggest the best attractions to visit each day with timing recommendations
4. Include restaurant recommendations for meals
5. Consider travel time between locations
6. Provide estimated costs where possible
7. Add practical tips for the destination

{ITINERARY_FORMAT}"#
        )
    }

    fn revise_prompt(current: &str, feedback: &str, history: &str) -> String {
        let history = if history.is_empty() { "No previous conversation" } else { history };
        format!(
            r#"The user has provided feedback on their current itinerary. Update the itinerary based on their feedback.

## Conversation History:
{history}

## Current Itinerary:
{current}

## User Feedback:
{feedback}

## Instructions:
1. Address all points mentioned in the user's feedback
2. Consider the context from the conversation history
3. Maintain the overall structure while incorporating changes
4. Ensure the updated itinerary is still practical and well-organized
5. Mention what changed in the "overview"

{ITINERARY_FORMAT}"#
        )
    }
}

#[async_trait]
impl ItineraryPlanner for PlannerAgent {
    async fn plan(&self, ctx: &TurnContext, request: PlanRequest<'_>) -> Result<Itinerary> {
        match request {
            PlanRequest::Create { trip, search } => {
                let prompt = Self::create_prompt(&trip.describe(), &search.to_prompt_text());
                let llm_request =
                    LlmRequest::prompt(agents::PLANNER, "create_itinerary", prompt).with_system(SYSTEM_PROMPT);
                let completion = generate_traced(self.ai.as_ref(), ctx, llm_request).await?;

                let itinerary = Itinerary::from_llm_reply(&completion.content)?
                    .with_defaults(trip.destination.as_deref(), trip.dates.as_deref());
                info!(
                    "Created {}-day itinerary for {}",
                    itinerary.num_days(),
                    itinerary.destination
                );
                Ok(itinerary)
            }
            PlanRequest::Revise {
                current,
                feedback,
                history,
            } => {
                let prompt = Self::revise_prompt(&current.to_prompt_json(), feedback, &history_excerpt(history));
                let llm_request =
                    LlmRequest::prompt(agents::PLANNER, "optimize_itinerary", prompt).with_system(SYSTEM_PROMPT);
                let completion = generate_traced(self.ai.as_ref(), ctx, llm_request).await?;

                let mut itinerary = Itinerary::from_llm_reply(&completion.content)?
                    .with_defaults(Some(current.destination.as_str()), None);
                if itinerary.dates == TravelDates::default() {
                    itinerary.dates = current.dates.clone();
                }
                info!("Revised itinerary for {}", itinerary.destination);
                Ok(itinerary)
            }
        }
    }
}
