//! Lexicon-based sentiment scoring.
//!
//! This is a stand-in for a real sentiment model. It counts hits against two
//! small word lists and is only meant to be deterministic and cheap, not
//! linguistically accurate. For a model-backed judgement see
//! [`crate::email::EmailAutomation::analyze_sentiment_with_model`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tokenizer::Tokenizer;
use crate::config::SentimentConfig;

/// Coarse polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// Score in `[-1, 1]` plus the label derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}

/// Counts positive and negative lexicon hits over normalized tokens.
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    tokenizer: Tokenizer,
    positive: HashSet<String>,
    negative: HashSet<String>,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(Tokenizer::default(), &SentimentConfig::default())
    }
}

impl SentimentScorer {
    pub fn new(tokenizer: Tokenizer, config: &SentimentConfig) -> Self {
        Self {
            tokenizer,
            positive: config.positive_words.iter().map(|w| w.to_lowercase()).collect(),
            negative: config.negative_words.iter().map(|w| w.to_lowercase()).collect(),
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
        }
    }

    /// `(positive - negative) / max(token_count, 1)`, thresholded into a label.
    ///
    /// Stopwords are kept, so they dilute the score the same way every time.
    pub fn score(&self, text: &str) -> SentimentResult {
        let tokens = self.tokenizer.tokenize(text);
        let positive = tokens.iter().filter(|t| self.positive.contains(*t)).count();
        let negative = tokens.iter().filter(|t| self.negative.contains(*t)).count();

        let score = (positive as f64 - negative as f64) / tokens.len().max(1) as f64;
        SentimentResult {
            score,
            label: self.label_for(score),
        }
    }

    /// Ordered threshold table; first match wins.
    pub fn label_for(&self, score: f64) -> SentimentLabel {
        let rules: [(bool, SentimentLabel); 2] = [
            (score > self.positive_threshold, SentimentLabel::Positive),
            (score < self.negative_threshold, SentimentLabel::Negative),
        ];
        rules
            .into_iter()
            .find_map(|(hit, label)| hit.then_some(label))
            .unwrap_or(SentimentLabel::Neutral)
    }
}
