//! Search agent
//!
//! Turns a trip request into web searches for flights, hotels, attractions
//! and restaurants. Categories are chosen from what is known: flights need
//! an origin, everything else needs a destination.

use crate::agents::TripSearcher;
use crate::context::TurnContext;
use crate::tools::{AiTool, SearchHit, WebSearchTool};
use crate::usage::Span;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use voyage_common::{DEFAULT_SEARCH_RESULTS, Result, VoyageError, agents, providers};

const FLEXIBLE: &str = "flexible";

/// What to search for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub dates: Option<String>,
    pub preferences: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    Flights,
    Hotels,
    Attractions,
    Restaurants,
}

impl SearchCategory {
    pub const ALL: [SearchCategory; 4] = [
        SearchCategory::Flights,
        SearchCategory::Hotels,
        SearchCategory::Attractions,
        SearchCategory::Restaurants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::Flights => "flights",
            SearchCategory::Hotels => "hotels",
            SearchCategory::Attractions => "attractions",
            SearchCategory::Restaurants => "restaurants",
        }
    }

    /// Web query for this category, or `None` when the query lacks what it needs
    pub fn query_text(&self, query: &SearchQuery) -> Option<String> {
        let destination = query.destination.as_deref()?;
        let dates = query.dates.as_deref().unwrap_or(FLEXIBLE);
        match self {
            SearchCategory::Flights => {
                let origin = query.origin.as_deref()?;
                Some(format!(
                    "cheapest flights from {} to {} on {} prices booking",
                    origin, destination, dates
                ))
            }
            SearchCategory::Hotels => Some(format!("best hotels in {} for {} prices booking", destination, dates)),
            SearchCategory::Attractions => Some(format!("top tourist attractions things to do in {}", destination)),
            SearchCategory::Restaurants => Some(format!(
                "best restaurants to eat in {} local food recommendations",
                destination
            )),
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of one category's search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    pub category: SearchCategory,
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Raw snippets grouped per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub sections: Vec<SearchSection>,
    /// Things the planner should know, e.g. that search was unavailable
    pub notes: Vec<String>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.hits.is_empty())
    }

    pub fn total_hits(&self) -> usize {
        self.sections.iter().map(|s| s.hits.len()).sum()
    }

    pub fn section(&self, category: SearchCategory) -> Option<&SearchSection> {
        self.sections.iter().find(|s| s.category == category)
    }

    /// Plain-text rendering for prompts
    pub fn to_prompt_text(&self) -> String {
        if self.sections.is_empty() && self.notes.is_empty() {
            return "No searches performed yet".to_string();
        }
        let mut out = String::new();
        for note in &self.notes {
            out.push_str(&format!("Note: {}\n", note));
        }
        for section in &self.sections {
            out.push_str(&format!("\n### {} ({})\n", section.category, section.query));
            if section.hits.is_empty() {
                out.push_str("No results.\n");
            }
            for hit in &section.hits {
                out.push_str(&format!("- {}: {} [{}]\n", hit.title, hit.snippet, hit.link));
            }
        }
        out.trim().to_string()
    }
}

/// Web-search-backed [`TripSearcher`]
pub struct SearchAgent {
    tool: Option<Arc<dyn AiTool>>,
    num_results: usize,
}

impl SearchAgent {
    /// Search through Serper when a key is configured; disabled otherwise
    pub fn new(serper_api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let tool = match serper_api_key {
            Some(key) => Some(Arc::new(WebSearchTool::new(key, timeout)?) as Arc<dyn AiTool>),
            None => {
                warn!("SERPER_API_KEY not configured, web search is disabled");
                None
            }
        };
        Ok(Self {
            tool,
            num_results: DEFAULT_SEARCH_RESULTS,
        })
    }

    pub fn with_tool(tool: Arc<dyn AiTool>) -> Self {
        Self {
            tool: Some(tool),
            num_results: DEFAULT_SEARCH_RESULTS,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tool.is_some()
    }

    async fn run_category(
        &self,
        ctx: &TurnContext,
        tool: &dyn AiTool,
        category: SearchCategory,
        query: String,
    ) -> Result<SearchSection> {
        let params = json!({"query": query, "num_results": self.num_results});
        tool.validate_params(&params)?;
        let started = Instant::now();
        let result = tool.execute(params).await;

        let span = Span::new(agents::SEARCH, &format!("search_{}", category), providers::SERPER, tool.name())
            .with_duration_ms(started.elapsed().as_secs_f64() * 1000.0);
        let span = match &result {
            Ok(_) => span,
            Err(err) => span.failed(err.to_string()),
        };
        ctx.trace.record(span).await;

        let value = result?;
        let hits = match value.get("results") {
            Some(results) => serde_json::from_value::<Vec<SearchHit>>(results.clone())?,
            None => {
                return Err(VoyageError::upstream(
                    tool.name(),
                    format!("unexpected tool output: {}", value),
                ));
            }
        };
        debug!("{} search returned {} hits", category, hits.len());

        Ok(SearchSection { category, query, hits })
    }
}

#[async_trait]
impl TripSearcher for SearchAgent {
    async fn search(&self, ctx: &TurnContext, query: &SearchQuery) -> Result<SearchResults> {
        let mut results = SearchResults::default();
        let Some(tool) = &self.tool else {
            results
                .notes
                .push("Web search is unavailable; plan from general knowledge.".to_string());
            return Ok(results);
        };

        for category in SearchCategory::ALL {
            let Some(text) = category.query_text(query) else {
                continue;
            };
            let section = self.run_category(ctx, tool.as_ref(), category, text).await?;
            results.sections.push(section);
        }

        info!(
            "Search for {:?} finished: {} categories, {} hits",
            query.destination,
            results.sections.len(),
            results.total_hits()
        );
        Ok(results)
    }
}
