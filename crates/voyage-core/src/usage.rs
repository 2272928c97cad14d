//! Turn tracing and token usage tracking
//!
//! Every orchestrated turn opens a [`Trace`]; every external call made while
//! handling it is recorded as a [`Span`] with token counts and timing. The
//! tracker keeps a bounded window of recent traces in memory and derives
//! usage summaries and cost estimates from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use voyage_common::{PricingConfig, generate_short_id};

/// Outcome of a traced operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Error,
}

/// Token counts reported for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenCounts {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A single external call within a trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub agent: String,
    pub action: String,
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    pub duration_ms: f64,
    pub estimated_cost_usd: f64,
    pub status: RunStatus,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Span {
    pub fn new(agent: &str, action: &str, provider: &str, model: &str) -> Self {
        Self {
            span_id: generate_short_id(),
            agent: agent.to_string(),
            action: action.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            tokens: TokenCounts::default(),
            duration_ms: 0.0,
            estimated_cost_usd: 0.0,
            status: RunStatus::Success,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tokens(mut self, tokens: TokenCounts) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = RunStatus::Error;
        self.error = Some(error.into());
        self
    }
}

/// A group of spans recorded while handling one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: String,
    pub name: String,
    pub session_id: String,
    pub spans: Vec<Span>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_tokens: u32,
    pub total_duration_ms: f64,
    pub status: RunStatus,
}

impl Trace {
    fn new(name: &str, session_id: &str) -> Self {
        Self {
            trace_id: generate_short_id(),
            name: name.to_string(),
            session_id: session_id.to_string(),
            spans: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            total_tokens: 0,
            total_duration_ms: 0.0,
            status: RunStatus::Running,
        }
    }

    fn add_span(&mut self, span: Span) {
        self.total_tokens += span.tokens.total_tokens;
        self.total_duration_ms += span.duration_ms;
        self.spans.push(span);
    }
}

/// Call and token totals for one agent or model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBucket {
    pub calls: u32,
    pub tokens: u32,
}

/// Aggregate usage over the retained traces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_traces: usize,
    pub total_calls: u32,
    pub total_prompt_tokens: u32,
    pub total_completion_tokens: u32,
    pub total_tokens: u32,
    pub by_agent: BTreeMap<String, UsageBucket>,
    pub by_model: BTreeMap<String, UsageBucket>,
    pub estimated_cost_usd: f64,
}

/// Bounded in-memory store of recent traces
pub struct UsageTracker {
    traces: RwLock<VecDeque<Trace>>,
    capacity: usize,
    pricing: PricingConfig,
}

impl UsageTracker {
    pub fn new(capacity: usize) -> Arc<Self> {
        Self::with_pricing(capacity, PricingConfig::default())
    }

    pub fn with_pricing(capacity: usize, pricing: PricingConfig) -> Arc<Self> {
        Arc::new(Self {
            traces: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
            pricing,
        })
    }

    /// Open a new trace; the oldest trace is dropped once capacity is reached
    pub async fn start_trace(self: &Arc<Self>, name: &str, session_id: &str) -> TraceHandle {
        let trace = Trace::new(name, session_id);
        let handle = TraceHandle {
            tracker: Arc::clone(self),
            trace_id: trace.trace_id.clone(),
            name: trace.name.clone(),
        };

        let mut traces = self.traces.write().await;
        while traces.len() >= self.capacity {
            traces.pop_front();
        }
        traces.push_back(trace);
        handle
    }

    async fn record_span(&self, trace_id: &str, trace_name: &str, mut span: Span) {
        span.estimated_cost_usd = self.pricing.calculate_cost(
            &span.provider,
            &span.model,
            span.tokens.prompt_tokens,
            span.tokens.completion_tokens,
        );

        match &span.error {
            Some(err) => error!(
                "[{}:{}] {} | Model: {} | Duration: {:.0}ms | Status: error | Error: {}",
                trace_name, span.agent, span.action, span.model, span.duration_ms, err
            ),
            None => info!(
                "[{}:{}] {} | Model: {} | Tokens: {}+{}={} | Duration: {:.0}ms | Status: success",
                trace_name,
                span.agent,
                span.action,
                span.model,
                span.tokens.prompt_tokens,
                span.tokens.completion_tokens,
                span.tokens.total_tokens,
                span.duration_ms
            ),
        }

        let mut traces = self.traces.write().await;
        // Evicted traces drop their late spans
        if let Some(trace) = traces.iter_mut().rev().find(|t| t.trace_id == trace_id) {
            trace.add_span(span);
        }
    }

    async fn finish_trace(&self, trace_id: &str, status: RunStatus) {
        let mut traces = self.traces.write().await;
        if let Some(trace) = traces.iter_mut().rev().find(|t| t.trace_id == trace_id) {
            trace.end_time = Some(Utc::now());
            trace.status = status;
        }
    }

    /// Up to `limit` most recent traces, oldest first
    pub async fn recent_traces(&self, limit: usize) -> Vec<Trace> {
        let traces = self.traces.read().await;
        let skip = traces.len().saturating_sub(limit);
        traces.iter().skip(skip).cloned().collect()
    }

    pub async fn summary(&self) -> UsageSummary {
        let traces = self.traces.read().await;
        let mut summary = UsageSummary {
            total_traces: traces.len(),
            ..UsageSummary::default()
        };

        for span in traces.iter().flat_map(|t| t.spans.iter()) {
            summary.total_calls += 1;
            summary.total_prompt_tokens += span.tokens.prompt_tokens;
            summary.total_completion_tokens += span.tokens.completion_tokens;
            summary.total_tokens += span.tokens.total_tokens;
            summary.estimated_cost_usd += span.estimated_cost_usd;

            let agent = summary.by_agent.entry(span.agent.clone()).or_default();
            agent.calls += 1;
            agent.tokens += span.tokens.total_tokens;

            let model = summary.by_model.entry(span.model.clone()).or_default();
            model.calls += 1;
            model.tokens += span.tokens.total_tokens;
        }

        summary
    }

    pub async fn clear(&self) {
        self.traces.write().await.clear();
        info!("Cleared recorded traces");
    }

    /// Markdown report of usage and the ten most recent traces
    pub async fn format_report(&self) -> String {
        let summary = self.summary().await;
        if summary.total_traces == 0 {
            return "No traces recorded yet.".to_string();
        }

        let mut lines = vec!["## Usage\n".to_string()];
        lines.push(format!(
            "**Total Traces:** {} | **Total Calls:** {}",
            summary.total_traces, summary.total_calls
        ));
        lines.push(format!("**Total Tokens:** {}", summary.total_tokens));
        lines.push(format!("**Estimated Cost:** ${:.4}\n", summary.estimated_cost_usd));

        if !summary.by_model.is_empty() {
            lines.push("**By Model:**".to_string());
            for (model, bucket) in &summary.by_model {
                lines.push(format!("- {}: {} calls, {} tokens", model, bucket.calls, bucket.tokens));
            }
            lines.push(String::new());
        }

        lines.push("### Recent Traces\n".to_string());
        for trace in self.recent_traces(10).await.iter().rev() {
            let icon = if trace.status == RunStatus::Error { "✗" } else { "✓" };
            lines.push(format!(
                "**{} {}** (ID: {}) | {} spans | {} tokens | {:.0}ms",
                icon,
                trace.name,
                trace.trace_id,
                trace.spans.len(),
                trace.total_tokens,
                trace.total_duration_ms
            ));
            for span in &trace.spans {
                let icon = if span.status == RunStatus::Error { "✗" } else { "✓" };
                lines.push(format!(
                    "  - {} `{}` {} | {} | {} tokens | {:.0}ms",
                    icon, span.agent, span.action, span.model, span.tokens.total_tokens, span.duration_ms
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

/// Handle to the trace of the turn in progress
#[derive(Clone)]
pub struct TraceHandle {
    tracker: Arc<UsageTracker>,
    trace_id: String,
    name: String,
}

impl TraceHandle {
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub async fn record(&self, span: Span) {
        self.tracker.record_span(&self.trace_id, &self.name, span).await;
    }

    pub async fn finish(&self, status: RunStatus) {
        self.tracker.finish_trace(&self.trace_id, status).await;
    }
}

impl std::fmt::Debug for TraceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceHandle")
            .field("trace_id", &self.trace_id)
            .field("name", &self.name)
            .finish()
    }
}
