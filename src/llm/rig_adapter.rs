//! Bridge from rig's `CompletionModel` to our `LlmProvider`.

use std::time::Duration;

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::completion::message::{AssistantContent, Message};
use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Builds provider-specific request parameters rig has no builder method for.
pub type ParamsFn = fn(&CompletionRequest) -> Option<Value>;

/// Wraps any rig completion model as an `LlmProvider`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    timeout: Option<Duration>,
    additional_params: Option<ParamsFn>,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            timeout: None,
            additional_params: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_additional_params(mut self, params: ParamsFn) -> Self {
        self.additional_params = Some(params);
        self
    }

    fn request_failed(&self, reason: impl Into<String>) -> LlmError {
        LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let parts = split_messages(&request.messages)
            .ok_or_else(|| self.request_failed("request has no user or assistant message"))?;

        let mut builder = self
            .model
            .completion_request(to_rig_message(parts.prompt))
            .messages(parts.history.into_iter().map(to_rig_message).collect());
        if let Some(preamble) = parts.preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }
        if let Some(params) = self.additional_params.and_then(|build| build(&request)) {
            builder = builder.additional_params(params);
        }

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, builder.send())
                .await
                .map_err(|_| LlmError::Timeout {
                    provider: self.model_name.clone(),
                    timeout,
                })?,
            None => builder.send().await,
        };
        let response = result.map_err(|e| self.request_failed(e.to_string()))?;

        let content: String = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect();
        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "response contained no text".to_string(),
            });
        }

        Ok(CompletionResponse {
            content,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}

/// A request reshaped for rig: system text, prior turns, final prompt.
#[derive(Debug)]
struct MessageParts<'a> {
    preamble: Option<String>,
    history: Vec<&'a ChatMessage>,
    prompt: &'a ChatMessage,
}

/// System messages are joined into the preamble. The last remaining
/// message is the prompt; `None` when there is none.
fn split_messages(messages: &[ChatMessage]) -> Option<MessageParts<'_>> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut history: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();
    let prompt = history.pop()?;

    Some(MessageParts {
        preamble: (!system.is_empty()).then(|| system.join("\n\n")),
        history,
        prompt,
    })
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        Role::Assistant => Message::assistant(message.content.clone()),
        Role::User | Role::System => Message::user(message.content.clone()),
    }
}

/// `top_p` and `top_k` in the shape of Gemini's `generationConfig`.
/// Temperature and token limit go through rig's own builder.
pub fn gemini_generation_config(request: &CompletionRequest) -> Option<Value> {
    let mut config = Map::new();
    if let Some(top_p) = request.top_p {
        config.insert("topP".to_string(), Value::from(top_p));
    }
    if let Some(top_k) = request.top_k {
        config.insert("topK".to_string(), Value::from(top_k));
    }
    if config.is_empty() {
        return None;
    }
    let mut params = Map::new();
    params.insert("generationConfig".to_string(), Value::Object(config));
    Some(Value::Object(params))
}
