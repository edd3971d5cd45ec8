//! Named-entity extraction.
//!
//! The recognizer itself is a black box behind `EntityRecognizer`. The
//! extractor owns the contract around it: empty input short-circuits,
//! spans are validated against the source text, and results are ordered
//! by start offset. Recognizer failures are returned, not swallowed; the
//! caller picks the fallback.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecognizerError;

/// A labelled span of the original (unnormalized) text.
///
/// `start` and `end` are byte offsets, so `&original[start..end] == text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Open label set, decided by the recognizer (`PERSON`, `ORG`, `DATE`, ...).
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            start,
            end,
        }
    }
}

/// A named-entity recognition capability.
pub trait EntityRecognizer: Send + Sync {
    /// Recognizer name, for logging.
    fn name(&self) -> &str;

    /// Recognize entities in raw text.
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError>;
}

/// Runs a recognizer over raw text and enforces the span contract.
#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PatternRecognizer::new()))
    }
}

impl EntityExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Extract entities ordered by ascending `start`; ties keep recognizer order.
    pub fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, RecognizerError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut entities: Vec<Entity> = self
            .recognizer
            .recognize(text)?
            .into_iter()
            .filter(|entity| {
                let valid = entity.start <= entity.end
                    && entity.end <= text.len()
                    && text.is_char_boundary(entity.start)
                    && text.is_char_boundary(entity.end);
                if !valid {
                    debug!(
                        recognizer = self.recognizer.name(),
                        start = entity.start,
                        end = entity.end,
                        len = text.len(),
                        "Dropping out-of-bounds entity span"
                    );
                }
                valid
            })
            .collect();

        // Stable: equal starts keep recognizer order.
        entities.sort_by_key(|entity| entity.start);
        Ok(entities)
    }
}

// ── Pattern recognizer ──────────────────────────────────────────────

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhttps?://[^\s<>"]*[^\s<>".,;:!?)]"#).unwrap());

static RE_MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[$€£]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:k|m|bn|million|billion|thousand)\b)?|\b\d[\d,]*(?:\.\d+)?\s?(?:usd|eur|gbp|dollars|euros|pounds)\b",
    )
    .unwrap()
});

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?(?:\s?%|\s?percent\b)").unwrap());

static RE_DATE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());

static RE_DATE_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());

static RE_DATE_WRITTEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?\b",
    )
    .unwrap()
});

static RE_DATE_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:today|tomorrow|yesterday|(?:next|last|this) (?:week|month|quarter|year)|(?:next |last )?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday))\b",
    )
    .unwrap()
});

static RE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s?(?:am|pm)\b|\b\d{1,2}:\d{2}\b").unwrap()
});

static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?\(?\b\d{3}\)?[\s.-]\d{3}[\s.-]\d{4}\b").unwrap()
});

static RE_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?").unwrap()
});

static RE_ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z&]*\s+)+(?:Inc|Corp|Corporation|LLC|Ltd|Co|Company|Group|GmbH|PLC)\b\.?",
    )
    .unwrap()
});

/// Pattern table, checked in this order. Earlier rows win ties on equal spans.
static PATTERNS: &[(&str, &LazyLock<Regex>)] = &[
    ("EMAIL", &RE_EMAIL),
    ("URL", &RE_URL),
    ("MONEY", &RE_MONEY),
    ("PERCENT", &RE_PERCENT),
    ("DATE", &RE_DATE_ISO),
    ("DATE", &RE_DATE_NUMERIC),
    ("DATE", &RE_DATE_WRITTEN),
    ("DATE", &RE_DATE_RELATIVE),
    ("TIME", &RE_TIME),
    ("PHONE", &RE_PHONE),
    ("PERSON", &RE_PERSON),
    ("ORG", &RE_ORG),
];

/// Deterministic regex recognizer.
///
/// A lightweight stand-in for a statistical NER model: it finds contact
/// details, amounts, dates and times, honorific-prefixed names and
/// organisations with a corporate suffix. Overlapping matches resolve to
/// the earliest span, then the longest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRecognizer;

impl PatternRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError> {
        let mut candidates: Vec<(usize, Entity)> = Vec::new();
        for (rank, (label, regex)) in PATTERNS.iter().enumerate() {
            for m in regex.find_iter(text) {
                if m.as_str().trim().is_empty() {
                    continue;
                }
                candidates.push((rank, Entity::new(m.as_str(), *label, m.start(), m.end())));
            }
        }

        candidates.sort_by(|(rank_a, a), (rank_b, b)| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.end.cmp(&a.end))
                .then_with(|| rank_a.cmp(rank_b))
        });

        let mut entities = Vec::new();
        let mut covered_until = 0usize;
        for (_, entity) in candidates {
            if entity.start < covered_until {
                continue;
            }
            covered_until = entity.end;
            entities.push(entity);
        }
        Ok(entities)
    }
}
