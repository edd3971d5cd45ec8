//! Structured-output parsing of model replies.
//!
//! Models are asked for a JSON object and usually comply, but often wrap it
//! in a markdown fence or a sentence of preamble. Parsing is strict about
//! the fields once the object is found: a reply that does not carry them is
//! an error, never a made-up result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::preprocess::SentimentLabel;

/// Overall user satisfaction estimated from a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Satisfaction {
    High,
    Medium,
    Low,
}

impl FromStr for Satisfaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown satisfaction level: {other}")),
        }
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// Topics, sentiment and follow-ups of a finished conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    pub topics: Vec<String>,
    pub sentiment: SentimentLabel,
    pub action_items: Vec<String>,
    pub satisfaction: Satisfaction,
}

/// A model's judgement of a text's sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSentiment {
    pub sentiment: SentimentLabel,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    /// Free-form register: formal, informal, friendly, urgent, ...
    pub tone: String,
}

#[derive(Deserialize)]
struct RawConversationAnalysis {
    #[serde(default)]
    topics: Vec<String>,
    sentiment: String,
    #[serde(default)]
    action_items: Vec<String>,
    satisfaction: String,
}

#[derive(Deserialize)]
struct RawModelSentiment {
    sentiment: String,
    confidence: f64,
    #[serde(default)]
    tone: String,
}

/// Parse a `{topics, sentiment, action_items, satisfaction}` reply.
pub fn parse_conversation_analysis(reply: &str) -> Result<ConversationAnalysis, PipelineError> {
    let raw: RawConversationAnalysis = decode(reply)?;
    Ok(ConversationAnalysis {
        topics: raw.topics,
        sentiment: raw.sentiment.parse().map_err(PipelineError::Parse)?,
        action_items: raw.action_items,
        satisfaction: raw.satisfaction.parse().map_err(PipelineError::Parse)?,
    })
}

/// Parse a `{sentiment, confidence, tone}` reply. Confidence is clamped to `[0, 1]`.
pub fn parse_model_sentiment(reply: &str) -> Result<ModelSentiment, PipelineError> {
    let raw: RawModelSentiment = decode(reply)?;
    if !raw.confidence.is_finite() {
        return Err(PipelineError::Parse(format!(
            "confidence is not a finite number: {}",
            raw.confidence
        )));
    }
    Ok(ModelSentiment {
        sentiment: raw.sentiment.parse().map_err(PipelineError::Parse)?,
        confidence: raw.confidence.clamp(0.0, 1.0),
        tone: raw.tone.trim().to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(reply: &str) -> Result<T, PipelineError> {
    let json = extract_json_object(reply);
    serde_json::from_str(json).map_err(|e| {
        let preview: String = reply.chars().take(200).collect();
        PipelineError::Parse(format!("{e} (reply: {preview})"))
    })
}

/// Find the JSON object in a model reply, handling markdown fences and preamble.
pub fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return &trimmed[start..=end];
    }

    trimmed
}
