//! Configuration types.
//!
//! Every tunable is an explicit value handed to a component constructor.
//! `from_env()` layers optional environment overrides on top of the defaults.

use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::llm::LlmConfig;

/// Parse an optional override, falling back to `default` when absent or invalid.
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Invalid configuration value, using default");
                default
            }
        },
        None => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Sampling parameters for every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            top_k: 40,
            max_tokens: 1024,
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            temperature: parse_or(&lookup, "COMMFLOW_TEMPERATURE", defaults.temperature),
            top_p: parse_or(&lookup, "COMMFLOW_TOP_P", defaults.top_p),
            top_k: parse_or(&lookup, "COMMFLOW_TOP_K", defaults.top_k),
            max_tokens: parse_or(&lookup, "COMMFLOW_MAX_TOKENS", defaults.max_tokens),
        }
    }
}

/// Lexicon and thresholds for the rule-based sentiment scorer.
#[derive(Debug, Clone)]
pub struct SentimentConfig {
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    /// Scores strictly above this are positive.
    pub positive_threshold: f64,
    /// Scores strictly below this are negative.
    pub negative_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_words: owned(&["good", "great", "excellent", "positive", "happy", "satisfied"]),
            negative_words: owned(&["bad", "poor", "negative", "unhappy", "dissatisfied"]),
            positive_threshold: 0.05,
            negative_threshold: -0.05,
        }
    }
}

/// Word sets and confidences driving the intent rule table.
#[derive(Debug, Clone)]
pub struct IntentConfig {
    pub greeting_words: Vec<String>,
    pub request_words: Vec<String>,
    pub complaint_words: Vec<String>,
    pub greeting_confidence: f32,
    /// Confidence of the `?` rule.
    pub question_confidence: f32,
    pub request_confidence: f32,
    pub complaint_confidence: f32,
    /// Confidence when no rule matches.
    pub default_confidence: f32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            greeting_words: owned(&["hi", "hello", "hey"]),
            request_words: owned(&["can", "could", "please"]),
            complaint_words: owned(&["bad", "issue", "problem", "wrong"]),
            greeting_confidence: 0.9,
            question_confidence: 0.8,
            request_confidence: 0.7,
            complaint_confidence: 0.7,
            default_confidence: 0.6,
        }
    }
}

/// Chatbot configuration.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// Maximum number of turns kept in a conversation.
    pub max_history: usize,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self { max_history: 10 }
    }
}

impl ChatbotConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_history: parse_or(&lookup, "COMMFLOW_MAX_HISTORY", defaults.max_history),
        }
    }
}

/// Email automation configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Allowed categories. The first one is the fallback.
    pub categories: Vec<String>,
    /// How many extracted entities are quoted in the reply prompt.
    pub max_prompt_entities: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            categories: owned(&["Business", "Support", "Meeting", "Finance"]),
            max_prompt_entities: 5,
        }
    }
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let categories = lookup("COMMFLOW_EMAIL_CATEGORIES")
            .map(|raw| split_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.categories);
        Self {
            categories,
            ..defaults
        }
    }

    /// The category used when the model reply is unusable.
    pub fn fallback_category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or("Business")
    }
}

/// Everything the binary needs, assembled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: Option<LlmConfig>,
    pub generation: GenerationConfig,
    pub sentiment: SentimentConfig,
    pub intent: IntentConfig,
    pub chatbot: ChatbotConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration. The LLM section is `None` when no API key is set.
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            generation: GenerationConfig::from_env(),
            sentiment: SentimentConfig::default(),
            intent: IntentConfig::default(),
            chatbot: ChatbotConfig::from_env(),
            email: EmailConfig::from_env(),
        }
    }

    /// The LLM section, for commands that call the model.
    pub fn require_llm(&self) -> Result<&LlmConfig, ConfigError> {
        self.llm
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn generation_defaults() {
        let config = GenerationConfig::default();
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!((config.top_p - 0.95).abs() < f32::EPSILON);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn generation_overrides_apply() {
        let config = GenerationConfig::from_vars(vars(&[
            ("COMMFLOW_TEMPERATURE", "0.7"),
            ("COMMFLOW_MAX_TOKENS", "256"),
        ]));
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.top_k, 40);
    }

    #[test]
    fn invalid_override_falls_back_to_default() {
        let config = ChatbotConfig::from_vars(vars(&[("COMMFLOW_MAX_HISTORY", "lots")]));
        assert_eq!(config.max_history, 10);
    }

    #[test]
    fn email_categories_from_list() {
        let config = EmailConfig::from_vars(vars(&[(
            "COMMFLOW_EMAIL_CATEGORIES",
            " Sales, Legal ,,HR ",
        )]));
        assert_eq!(config.categories, vec!["Sales", "Legal", "HR"]);
        assert_eq!(config.fallback_category(), "Sales");
    }

    #[test]
    fn missing_llm_section_names_the_key() {
        let config = AppConfig {
            llm: None,
            generation: GenerationConfig::default(),
            sentiment: SentimentConfig::default(),
            intent: IntentConfig::default(),
            chatbot: ChatbotConfig::default(),
            email: EmailConfig::default(),
        };
        let err = config.require_llm().unwrap_err();
        assert!(matches!(&err, ConfigError::MissingEnvVar(key) if key == "GEMINI_API_KEY"));
        assert_eq!(err.to_string(), "Missing required environment variable: GEMINI_API_KEY");
    }

    #[test]
    fn empty_category_list_keeps_defaults() {
        let config = EmailConfig::from_vars(vars(&[("COMMFLOW_EMAIL_CATEGORIES", " , ")]));
        assert_eq!(config.fallback_category(), "Business");
        assert_eq!(config.categories.len(), 4);
    }
}
