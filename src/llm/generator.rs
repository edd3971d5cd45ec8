//! Prompt-in, text-out wrapper used by every component that talks to the model.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Prefix some providers put on a reply when they swallowed an error.
pub const ERROR_SENTINEL_PREFIX: &str = "Error generating response:";

/// Single-prompt text generation with fixed sampling defaults.
#[derive(Clone)]
pub struct Generator {
    llm: Arc<dyn LlmProvider>,
    config: GenerationConfig,
}

impl Generator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Generate with the configured sampling parameters.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate_with(prompt, &self.config).await
    }

    /// Generate with per-call sampling parameters.
    ///
    /// A reply carrying the error sentinel is turned into `LlmError::Sentinel`
    /// so callers only ever see one failure shape.
    pub async fn generate_with(
        &self,
        prompt: &str,
        options: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(options.temperature)
            .with_top_p(options.top_p)
            .with_top_k(options.top_k)
            .with_max_tokens(options.max_tokens);

        let response = self.llm.complete(request).await?;

        if is_error_sentinel(&response.content) {
            return Err(LlmError::Sentinel(response.content.trim().to_string()));
        }
        if response.output_tokens >= u64::from(options.max_tokens) {
            warn!(
                model = self.llm.model_name(),
                max_tokens = options.max_tokens,
                "Generation reached the token limit, reply may be truncated"
            );
        }

        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generation complete"
        );
        Ok(response.content)
    }
}

/// Whether a reply is a provider-side error message rather than model output.
pub fn is_error_sentinel(reply: &str) -> bool {
    reply.trim_start().starts_with(ERROR_SENTINEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{FailingLlm, FixedLlm, RecordingLlm};

    #[tokio::test]
    async fn generate_returns_reply() {
        let generator = Generator::new(Arc::new(FixedLlm::new("Hello!")), GenerationConfig::default());
        assert_eq!(generator.generate("Say hi").await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn generate_forwards_sampling_parameters() {
        let llm = Arc::new(RecordingLlm::new("ok"));
        let generator = Generator::new(llm.clone(), GenerationConfig::default());
        let options = GenerationConfig {
            temperature: 0.9,
            top_p: 0.5,
            top_k: 7,
            max_tokens: 64,
        };
        generator.generate_with("prompt", &options).await.unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.9));
        assert_eq!(requests[0].top_k, Some(7));
        assert_eq!(requests[0].max_tokens, Some(64));
        assert_eq!(requests[0].messages[0].content, "prompt");
    }

    #[tokio::test]
    async fn sentinel_reply_becomes_error() {
        let generator = Generator::new(
            Arc::new(FixedLlm::new("Error generating response: quota exceeded")),
            GenerationConfig::default(),
        );
        let result = generator.generate("x").await;
        assert!(matches!(result, Err(LlmError::Sentinel(msg)) if msg.contains("quota")));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let generator = Generator::new(Arc::new(FailingLlm), GenerationConfig::default());
        assert!(matches!(
            generator.generate("x").await,
            Err(LlmError::RequestFailed { .. })
        ));
    }

    #[test]
    fn sentinel_detection() {
        assert!(is_error_sentinel("  Error generating response: boom"));
        assert!(!is_error_sentinel("Here is your reply"));
        assert!(!is_error_sentinel(""));
    }
}
