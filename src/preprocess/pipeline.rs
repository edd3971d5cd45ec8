//! Single entry point that turns raw text into a `PreprocessingResult`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::entities::{Entity, EntityExtractor, EntityRecognizer};
use super::normalizer::TextNormalizer;
use super::sentiment::{SentimentResult, SentimentScorer};
use super::tokenizer::Tokenizer;
use crate::error::RecognizerError;

/// Everything the downstream components need to know about one text.
///
/// `tokens` derive only from `cleaned`; `entities` derive from `original`
/// so recognizers see the original casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingResult {
    pub original: String,
    pub cleaned: String,
    pub tokens: Vec<String>,
    pub entities: Vec<Entity>,
    pub sentiment: SentimentResult,
}

impl PreprocessingResult {
    /// The result for empty input.
    pub fn empty() -> Self {
        Self {
            original: String::new(),
            cleaned: String::new(),
            tokens: Vec::new(),
            entities: Vec::new(),
            sentiment: SentimentResult::neutral(),
        }
    }
}

#[derive(Clone, Default)]
pub struct PreprocessingPipeline {
    normalizer: TextNormalizer,
    tokenizer: Tokenizer,
    extractor: EntityExtractor,
    scorer: SentimentScorer,
}

impl PreprocessingPipeline {
    pub fn new(tokenizer: Tokenizer, extractor: EntityExtractor, scorer: SentimentScorer) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            tokenizer,
            extractor,
            scorer,
        }
    }

    /// Swap the entity recognizer, keeping everything else.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.extractor = EntityExtractor::new(recognizer);
        self
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// `run(text, true)`.
    pub fn process(&self, text: &str) -> PreprocessingResult {
        self.run(text, true)
    }

    /// Never fails. A recognizer error degrades to an empty entity list;
    /// the rest of the result is computed locally and is always present.
    pub fn run(&self, text: &str, remove_stopwords: bool) -> PreprocessingResult {
        if text.is_empty() {
            return PreprocessingResult::empty();
        }

        let entities = match self.extractor.extract_entities(text) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(
                    recognizer = self.extractor.recognizer_name(),
                    error = %e,
                    "Entity recognition failed, continuing without entities"
                );
                Vec::new()
            }
        };
        self.assemble(text, remove_stopwords, entities)
    }

    /// Like `run`, but hands a recognizer failure back to the caller.
    pub fn try_run(
        &self,
        text: &str,
        remove_stopwords: bool,
    ) -> Result<PreprocessingResult, RecognizerError> {
        if text.is_empty() {
            return Ok(PreprocessingResult::empty());
        }

        let entities = self.extractor.extract_entities(text)?;
        Ok(self.assemble(text, remove_stopwords, entities))
    }

    fn assemble(&self, text: &str, remove_stopwords: bool, entities: Vec<Entity>) -> PreprocessingResult {
        let cleaned = self.normalizer.clean(text);
        let mut tokens = self.tokenizer.tokenize(&cleaned);
        if remove_stopwords {
            tokens = self.tokenizer.remove_stopwords(&tokens);
        }

        PreprocessingResult {
            original: text.to_string(),
            sentiment: self.scorer.score(&cleaned),
            cleaned,
            tokens,
            entities,
        }
    }
}
