//! Test doubles for `LlmProvider`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

fn response(content: impl Into<String>) -> CompletionResponse {
    CompletionResponse {
        content: content.into(),
        input_tokens: 10,
        output_tokens: 5,
    }
}

/// Always replies with the same text.
pub struct FixedLlm {
    reply: String,
}

impl FixedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for FixedLlm {
    fn model_name(&self) -> &str {
        "mock-fixed"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(response(self.reply.clone()))
    }
}

/// Always fails.
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    fn model_name(&self) -> &str {
        "mock-failing"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "mock".to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// Replays scripted results in order, then repeats the last one.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "mock-scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match next.unwrap_or_else(|| Err("script exhausted".to_string())) {
            Ok(text) => Ok(response(text)),
            Err(reason) => Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason,
            }),
        }
    }
}

/// Replies with fixed text and records every request.
pub struct RecordingLlm {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The user-message text of every recorded request.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    fn model_name(&self) -> &str {
        "mock-recording"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        Ok(response(self.reply.clone()))
    }
}
