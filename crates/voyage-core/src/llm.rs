//! LLM Service for interacting with AI models
//!
//! This module provides the [`AiService`] seam every agent talks through, and
//! [`LLMService`], its implementation over the `genai` client. The model to
//! call is always passed in explicitly.

use crate::context::TurnContext;
use crate::models::ModelClientConfig;
use crate::usage::{Span, TokenCounts};
use async_trait::async_trait;
use genai::Client as GenaiClient;
use genai::ModelIden;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenaiChatMessage, ChatOptions, ChatRequest, MessageContent};
use genai::resolver::{AuthData, AuthResolver};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;
use voyage_common::{ApiKeys, Result, VoyageError};

/// Internal representation of a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InternalChatMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

impl InternalChatMessage {
    pub fn to_genai(&self) -> GenaiChatMessage {
        match self {
            InternalChatMessage::System { content } => GenaiChatMessage::system(content),
            InternalChatMessage::User { content } => GenaiChatMessage::user(content),
            InternalChatMessage::Assistant { content } => GenaiChatMessage::assistant(content),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            InternalChatMessage::System { content }
            | InternalChatMessage::User { content }
            | InternalChatMessage::Assistant { content } => content,
        }
    }
}

/// One request to a model, labelled with the agent and action issuing it
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub agent: &'static str,
    pub action: &'static str,
    pub system: Option<String>,
    pub messages: Vec<InternalChatMessage>,
}

impl LlmRequest {
    /// A single-prompt request
    pub fn prompt(agent: &'static str, action: &'static str, prompt: impl Into<String>) -> Self {
        Self {
            agent,
            action,
            system: None,
            messages: vec![InternalChatMessage::User {
                content: prompt.into(),
            }],
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Text of the last user message
    pub fn last_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, InternalChatMessage::User { .. }))
            .map(InternalChatMessage::content)
            .unwrap_or_default()
    }
}

/// Text reply plus token usage
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenCounts,
}

/// A trait for AI services that can generate responses
#[async_trait]
pub trait AiService: Send + Sync {
    /// Generate a reply from the given model
    async fn generate(&self, model: &ModelClientConfig, request: &LlmRequest) -> Result<Completion>;
}

/// Run a request and record it as a span on the turn's trace
pub async fn generate_traced(
    ai: &dyn AiService,
    ctx: &TurnContext,
    request: LlmRequest,
) -> Result<Completion> {
    let started = Instant::now();
    let result = ai.generate(&ctx.model, &request).await;
    let elapsed = started.elapsed().as_secs_f64() * 1000.0;

    let span = Span::new(request.agent, request.action, &ctx.model.provider, &ctx.model.model_id)
        .with_duration_ms(elapsed);
    let span = match &result {
        Ok(completion) => span.with_tokens(completion.usage),
        Err(err) => span.failed(err.to_string()),
    };
    ctx.trace.record(span).await;

    result
}

/// Provider token counts; missing or negative values count as zero
fn token_count(count: Option<i32>) -> u32 {
    count.and_then(|c| u32::try_from(c).ok()).unwrap_or(0)
}

/// A service for interacting with LLMs through `genai`
pub struct LLMService {
    client: GenaiClient,
}

impl LLMService {
    /// Create a service whose provider credentials come from `keys`
    pub fn new(keys: &ApiKeys) -> Self {
        let keys = keys.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |model_iden: ModelIden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                let key = match model_iden.adapter_kind {
                    AdapterKind::OpenAI => keys.openai.clone(),
                    AdapterKind::Gemini => keys.gemini.clone(),
                    _ => None,
                };
                Ok(key.map(AuthData::from_single))
            },
        );

        let client = GenaiClient::builder()
            .with_auth_resolver(auth_resolver)
            .with_chat_options(ChatOptions {
                capture_content: Some(true),
                capture_usage: Some(true),
                ..Default::default()
            })
            .build();

        LLMService { client }
    }
}

#[async_trait]
impl AiService for LLMService {
    async fn generate(&self, model: &ModelClientConfig, request: &LlmRequest) -> Result<Completion> {
        if !model.has_api_key() {
            return Err(VoyageError::upstream(
                &model.provider,
                format!("{} client not initialized, no API key configured", model.display_name),
            ));
        }

        debug!(
            "{}.{}: sending {} messages to {}",
            request.agent,
            request.action,
            request.messages.len(),
            model.model_id
        );

        let genai_messages: Vec<GenaiChatMessage> =
            request.messages.iter().map(|msg| msg.to_genai()).collect();
        let mut chat_req = ChatRequest::new(genai_messages);
        if let Some(system) = &request.system {
            chat_req = chat_req.with_system(system.clone());
        }

        let response = self
            .client
            .exec_chat(&model.model_id, chat_req, None)
            .await
            .map_err(|e| VoyageError::upstream(&model.provider, e.to_string()))?;

        let usage = TokenCounts {
            prompt_tokens: token_count(response.usage.prompt_tokens),
            completion_tokens: token_count(response.usage.completion_tokens),
            total_tokens: token_count(response.usage.total_tokens),
        };

        let content = match response.content.first() {
            Some(MessageContent::Text(text)) => text.clone(),
            Some(_) => {
                return Err(VoyageError::upstream(
                    &model.provider,
                    "expected a text reply from the model",
                ));
            }
            None => return Err(VoyageError::upstream(&model.provider, "no content in chat response")),
        };
        debug!("{}.{}: received {} characters", request.agent, request.action, content.len());

        Ok(Completion { content, usage })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted [`AiService`] for agent tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies per action; records every request it sees
    #[derive(Default)]
    pub struct ScriptedAi {
        replies: Mutex<HashMap<&'static str, Vec<Result<Completion>>>>,
        pub seen: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedAi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, action: &'static str, content: &str) -> Self {
            self.push(action, Ok(Completion {
                content: content.to_string(),
                usage: TokenCounts::new(10, 20),
            }))
        }

        pub fn fail(self, action: &'static str, message: &str) -> Self {
            self.push(action, Err(VoyageError::upstream("openai", message)))
        }

        fn push(self, action: &'static str, reply: Result<Completion>) -> Self {
            self.replies.lock().unwrap().entry(action).or_default().push(reply);
            self
        }

        pub fn prompts_for(&self, action: &str) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.action == action)
                .map(|r| r.last_user_text().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl AiService for ScriptedAi {
        async fn generate(&self, _model: &ModelClientConfig, request: &LlmRequest) -> Result<Completion> {
            self.seen.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(request.action) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Err(VoyageError::upstream("openai", format!("no scripted reply for {}", request.action))),
            }
        }
    }
}
