//! Configuration types for Voyage

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TRACE_CAPACITY, env_keys, providers, timeouts};

/// API keys for the LLM providers and the search provider.
///
/// Read once at process start; nothing downstream touches the environment.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub serper: Option<String>,
}

impl ApiKeys {
    /// Collect keys from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Collect keys through an arbitrary lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            openai: read(env_keys::OPENAI_API_KEY),
            gemini: read(env_keys::GEMINI_API_KEY),
            serper: read(env_keys::SERPER_API_KEY),
        }
    }

    /// Key for a provider name as used in the model catalog
    pub fn for_provider(&self, provider: &str) -> Option<&str> {
        match provider {
            providers::OPENAI => self.openai.as_deref(),
            providers::GEMINI => self.gemini.as_deref(),
            providers::SERPER => self.serper.as_deref(),
            _ => None,
        }
    }
}

// Keys never end up in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &self.openai.as_ref().map(|_| "<set>"))
            .field("gemini", &self.gemini.as_ref().map(|_| "<set>"))
            .field("serper", &self.serper.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level runtime configuration shared by the API server and the CLI
#[derive(Debug, Clone)]
pub struct VoyageConfig {
    pub keys: ApiKeys,
    /// Model key or display name selected at start-up
    pub initial_model: Option<String>,
    /// Number of recent traces kept in memory
    pub trace_capacity: usize,
    /// Timeout for web search requests, in seconds
    pub search_timeout_secs: u64,
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            keys: ApiKeys::default(),
            initial_model: None,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            search_timeout_secs: timeouts::SEARCH_TIMEOUT_SECS,
        }
    }
}

impl VoyageConfig {
    /// Configuration with keys taken from the environment
    pub fn from_env() -> Self {
        Self {
            keys: ApiKeys::from_env(),
            ..Self::default()
        }
    }

    pub fn with_initial_model(mut self, model: Option<String>) -> Self {
        self.initial_model = model;
        self
    }

    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity.max(1);
        self
    }
}
