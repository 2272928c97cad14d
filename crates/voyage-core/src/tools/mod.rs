//! Tools module for the travel agents
//!
//! Tools wrap outside services behind a JSON-in, JSON-out interface so agents
//! can be tested against stand-ins.

pub mod web_search;

pub use web_search::{SearchHit, WebSearchTool};

use async_trait::async_trait;
use serde_json::Value;
use voyage_common::{Result, VoyageError};

/// A tool that can be used by an agent
#[async_trait]
pub trait AiTool: Send + Sync {
    /// The name of the tool
    fn name(&self) -> &str;

    /// The JSON schema for the tool's parameters
    fn schema(&self) -> Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Check that every field the schema lists as required is present
    fn validate_params(&self, params: &Value) -> Result<()> {
        let schema = self.schema();
        let required = schema.get("required").and_then(Value::as_array);
        for field in required.into_iter().flatten().filter_map(Value::as_str) {
            if params.get(field).is_none_or(Value::is_null) {
                return Err(VoyageError::InvalidRequest(format!(
                    "{}: missing '{}' parameter",
                    self.name(),
                    field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl AiTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo back"}
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, params: Value) -> Result<Value> {
            match params.get("text").and_then(Value::as_str) {
                Some(text) => Ok(json!(text)),
                None => Err(VoyageError::InvalidRequest("Missing 'text' parameter".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;
        assert!(tool.validate_params(&json!({"text": "hi"})).is_ok());
        let err = tool.validate_params(&json!({"text": null})).unwrap_err();
        assert!(err.to_string().contains("missing 'text'"));
        let result = tool.execute(json!({"text": "Hello, world!"})).await.unwrap();
        assert_eq!(result.as_str().unwrap(), "Hello, world!");
        assert!(tool.execute(json!({})).await.is_err());
    }
}
