//! Voyage Common Error Types
//!
//! Centralized error handling for all Voyage components

use thiserror::Error;

/// Main error type for Voyage operations
#[derive(Debug, Error)]
pub enum VoyageError {
    /// A model display name (or key) outside the fixed catalog
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    /// An LLM or search call failed: network, quota or malformed response
    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },

    /// No session exists for the given identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A client request that cannot be processed as sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoyageError {
    /// Build an upstream failure for the named external service
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        VoyageError::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Build an unknown-model error
    pub fn unknown_model(name: impl Into<String>) -> Self {
        VoyageError::UnknownModel { name: name.into() }
    }

    /// Whether this error came from an external collaborator
    pub fn is_upstream(&self) -> bool {
        matches!(self, VoyageError::Upstream { .. })
    }
}

/// Convenience result type for Voyage operations
pub type Result<T> = std::result::Result<T, VoyageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display() {
        let err = VoyageError::upstream("openai", "quota exceeded");
        assert_eq!(err.to_string(), "openai request failed: quota exceeded");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_unknown_model_is_not_upstream() {
        let err = VoyageError::unknown_model("not-a-model");
        assert!(!err.is_upstream());
        assert!(err.to_string().contains("not-a-model"));
    }

    #[test]
    fn test_serde_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: VoyageError = parse_err.into();
        assert!(matches!(err, VoyageError::Serde(_)));
    }
}
