//! LLM integration for commflow.
//!
//! The generation model is an injected collaborator (`LlmProvider`).
//! Supports:
//! - **Gemini**: API access via rig-core
//!
//! rig-core handles HTTP transport; `RigAdapter` bridges rig's
//! `CompletionModel` to our `LlmProvider`. Components never call a provider
//! directly; they go through `Generator`, which applies the sampling
//! defaults and normalises sentinel error replies.

pub mod generator;
#[cfg(test)]
pub(crate) mod mock;
pub mod provider;
mod rig_adapter;

pub use generator::{Generator, is_error_sentinel};
pub use provider::*;
pub use rig_adapter::{RigAdapter, gemini_generation_config};

use std::sync::Arc;
use std::time::Duration;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.0-pro-exp-02-05";

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Read the provider section. Returns `None` when `GEMINI_API_KEY` is unset.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;

        let model = std::env::var("COMMFLOW_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs: u64 = std::env::var("COMMFLOW_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            backend: LlmBackend::Gemini,
            api_key: secrecy::SecretString::from(api_key),
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Gemini => create_gemini_provider(config),
    }
}

fn create_gemini_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::gemini;

    let client: gemini::Client =
        gemini::Client::new(config.api_key.expose_secret()).map_err(|e| LlmError::RequestFailed {
            provider: "gemini".to_string(),
            reason: format!("Failed to create Gemini client: {}", e),
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(
        RigAdapter::new(model, &config.model)
            .with_timeout(config.timeout)
            .with_additional_params(gemini_generation_config),
    ))
}
