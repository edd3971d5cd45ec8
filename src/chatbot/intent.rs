//! Rule-based intent detection.
//!
//! Rules are an ordered table; the first matching rule decides the intent.
//! The order is the policy: a greeting that also asks a question is still a
//! greeting.
//!
//! Word rules match whole words of the lowercased input, so `"this"` does
//! not count as the greeting `"hi"`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::IntentConfig;
use crate::preprocess::{Entity, PreprocessingPipeline};

/// Coarse purpose of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Question,
    Request,
    Complaint,
    Feedback,
    Other,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Question => "question",
            Self::Request => "request",
            Self::Complaint => "complaint",
            Self::Feedback => "feedback",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Vec<Entity>,
}

/// Confidence reported when classification itself failed.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// What a rule looks for.
#[derive(Debug, Clone)]
pub enum RuleMatch {
    /// Any of these words appears as a whole word.
    AnyWord(HashSet<String>),
    /// The raw text contains this substring.
    Contains(String),
}

impl RuleMatch {
    pub fn any_word<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::AnyWord(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect())
    }

    fn matches(&self, text: &str, words: &HashSet<String>) -> bool {
        match self {
            Self::AnyWord(set) => set.iter().any(|w| words.contains(w)),
            Self::Contains(needle) => text.contains(needle.as_str()),
        }
    }
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub matcher: RuleMatch,
    pub intent: Intent,
    pub confidence: f32,
}

/// Ordered intent rules.
#[derive(Debug, Clone)]
pub struct IntentRules {
    rules: Vec<IntentRule>,
    default_confidence: f32,
}

impl Default for IntentRules {
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}

impl IntentRules {
    /// greeting > question mark > request > complaint.
    pub fn from_config(config: &IntentConfig) -> Self {
        let rules = vec![
            IntentRule {
                matcher: RuleMatch::any_word(&config.greeting_words),
                intent: Intent::Greeting,
                confidence: config.greeting_confidence,
            },
            IntentRule {
                matcher: RuleMatch::Contains("?".into()),
                intent: Intent::Question,
                confidence: config.question_confidence,
            },
            IntentRule {
                matcher: RuleMatch::any_word(&config.request_words),
                intent: Intent::Request,
                confidence: config.request_confidence,
            },
            IntentRule {
                matcher: RuleMatch::any_word(&config.complaint_words),
                intent: Intent::Complaint,
                confidence: config.complaint_confidence,
            },
        ];
        Self {
            rules,
            default_confidence: config.default_confidence,
        }
    }

    /// Append a rule with the lowest priority.
    pub fn push(&mut self, rule: IntentRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn default_confidence(&self) -> f32 {
        self.default_confidence
    }

    /// First matching rule, or `Other` at the default confidence.
    pub fn evaluate(&self, text: &str) -> (Intent, f32) {
        let words = words_of(text);
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(text, &words))
            .map(|rule| (rule.intent, rule.confidence))
            .unwrap_or((Intent::Other, self.default_confidence))
    }
}

/// Lowercased alphanumeric runs (apostrophes kept, so `can't` stays one word).
fn words_of(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Maps a message to an intent and attaches the entities found in it.
#[derive(Clone, Default)]
pub struct IntentClassifier {
    rules: IntentRules,
    pipeline: PreprocessingPipeline,
}

impl IntentClassifier {
    pub fn new(rules: IntentRules, pipeline: PreprocessingPipeline) -> Self {
        Self { rules, pipeline }
    }

    pub fn rules(&self) -> &IntentRules {
        &self.rules
    }

    /// Never fails. If preprocessing fails the result is `(Other, 0.5)`
    /// with no entities, which is distinct from the no-rule-matched `(Other, 0.6)`.
    pub fn detect_intent(&self, text: &str) -> IntentResult {
        let preprocessed = match self.pipeline.try_run(text, true) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Intent detection failed, using fallback intent");
                return IntentResult {
                    intent: Intent::Other,
                    confidence: FALLBACK_CONFIDENCE,
                    entities: Vec::new(),
                };
            }
        };

        let (intent, confidence) = self.rules.evaluate(text);
        debug!(%intent, confidence, "Intent detected");
        IntentResult {
            intent,
            confidence,
            entities: preprocessed.entities,
        }
    }
}
