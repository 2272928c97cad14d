//! Common constants used across Voyage

/// Session identifier used when a client does not send one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Trace name for one orchestrated conversation turn
pub const TURN_TRACE_NAME: &str = "travel_agent";

/// Default number of recent traces kept by the usage tracker
pub const DEFAULT_TRACE_CAPACITY: usize = 200;

/// Default number of traces returned by the traces endpoint
pub const DEFAULT_TRACE_LIMIT: usize = 50;

/// Number of recent turns fed back to the LLM as conversation context
pub const HISTORY_WINDOW: usize = 10;

/// Per-turn character cap when history is quoted into a prompt
pub const HISTORY_SNIPPET_CHARS: usize = 500;

/// Number of web results requested per search
pub const DEFAULT_SEARCH_RESULTS: usize = 10;

/// Environment variable names
pub mod env_keys {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
}

/// Model keys in the selectable catalog
pub mod models {
    pub const GPT_4O_MINI: &str = "gpt-4o-mini";
    pub const GEMINI_2_0_FLASH: &str = "gemini-2.0-flash";
}

/// Provider identifiers
pub mod providers {
    pub const OPENAI: &str = "openai";
    pub const GEMINI: &str = "gemini";
    pub const SERPER: &str = "serper";
}

/// Agent names used in traces and logs
pub mod agents {
    pub const SEARCH: &str = "SearchAgent";
    pub const PLANNER: &str = "PlannerAgent";
    pub const COMMUNICATION: &str = "CommunicationAgent";
}

/// Default timeout values in seconds
pub mod timeouts {
    pub const SEARCH_TIMEOUT_SECS: u64 = 30;
}

/// External endpoints
pub mod endpoints {
    pub const OPENAI: &str = "https://api.openai.com/v1/";
    pub const GEMINI: &str = "https://generativelanguage.googleapis.com/v1beta/";
    pub const SERPER_SEARCH: &str = "https://google.serper.dev/search";
}
