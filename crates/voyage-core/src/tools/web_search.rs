//! Web search over the Serper API

use crate::tools::AiTool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, trace};
use voyage_common::{DEFAULT_SEARCH_RESULTS, Result, VoyageError, endpoints, providers};

#[derive(Deserialize)]
struct SearchParams {
    query: String,
    num_results: Option<usize>,
}

/// A single organic search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Tool for searching Google through Serper.
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoyageError::Config(format!("failed to build search client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoints::SERPER_SEARCH.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Pull `organic` entries out of a Serper response body
    pub fn parse_organic(body: &Value, limit: usize) -> Vec<SearchHit> {
        let Some(items) = body.get("organic").and_then(Value::as_array) else {
            return Vec::new();
        };
        let field = |item: &Value, key: &str| item.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        items
            .iter()
            .map(|item| SearchHit {
                title: field(item, "title"),
                link: field(item, "link"),
                snippet: field(item, "snippet"),
            })
            .filter(|hit| !hit.title.is_empty() || !hit.snippet.is_empty())
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl AiTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default: 10, max: 20)"
                }
            },
            "required": ["query"]
        })
    }

    fn validate_params(&self, params: &Value) -> Result<()> {
        match params.get("query").and_then(Value::as_str) {
            Some(query) if !query.trim().is_empty() => Ok(()),
            _ => Err(VoyageError::InvalidRequest(
                "Missing or invalid 'query' parameter".to_string(),
            )),
        }
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        self.validate_params(&params)?;
        let params: SearchParams = serde_json::from_value(params)
            .map_err(|e| VoyageError::InvalidRequest(format!("invalid search parameters: {}", e)))?;
        let num_results = params.num_results.unwrap_or(DEFAULT_SEARCH_RESULTS).clamp(1, 20);

        debug!("Serper search: '{}' ({} results)", params.query, num_results);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": params.query, "num": num_results }))
            .send()
            .await
            .map_err(|e| VoyageError::upstream(providers::SERPER, e.to_string()))?
            .error_for_status()
            .map_err(|e| VoyageError::upstream(providers::SERPER, e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| VoyageError::upstream(providers::SERPER, format!("invalid response body: {}", e)))?;
        trace!("{:?}", body);

        let results = Self::parse_organic(&body, num_results);
        debug!("Parsed {} search results", results.len());

        Ok(json!({ "results": results }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> WebSearchTool {
        WebSearchTool::new("test-key", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_tool_metadata() {
        let tool = tool();
        assert_eq!(tool.name(), "web_search");

        let schema = tool.schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["query"].is_object());
        assert!(schema["required"].as_array().unwrap().contains(&json!("query")));
    }

    #[tokio::test]
    async fn test_parameter_validation() {
        let tool = tool();
        assert!(matches!(
            tool.execute(json!({})).await,
            Err(VoyageError::InvalidRequest(_))
        ));
        assert!(matches!(
            tool.execute(json!({"query": 123})).await,
            Err(VoyageError::InvalidRequest(_))
        ));
        assert!(tool.validate_params(&json!({"query": "   "})).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let tool = tool().with_endpoint("http://127.0.0.1:9/search");
        let err = tool.execute(json!({"query": "hotels in Paris"})).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn test_parse_organic() {
        let body = json!({
            "searchParameters": {"q": "paris"},
            "organic": [
                {"title": "Louvre", "link": "https://louvre.fr", "snippet": "Museum", "position": 1},
                {"title": "", "link": "https://empty.example"},
                {"title": "Eiffel Tower", "link": "https://toureiffel.paris"},
                {"title": "Orsay", "link": "https://orsay.fr", "snippet": "More art"}
            ]
        });
        let hits = WebSearchTool::parse_organic(&body, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Louvre");
        assert_eq!(hits[1].title, "Eiffel Tower");
        assert_eq!(hits[1].snippet, "");

        assert!(WebSearchTool::parse_organic(&json!({"answerBox": {}}), 5).is_empty());
    }
}
