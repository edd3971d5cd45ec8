//! Word tokenization and stopword filtering.

use std::collections::HashSet;

use super::normalizer::TextNormalizer;
use super::stopwords::StopwordLanguage;

/// Splits normalized text into word tokens.
///
/// `tokenize` always cleans its input first, so it is safe to hand it
/// either raw or already-cleaned text.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    normalizer: TextNormalizer,
    language: StopwordLanguage,
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(StopwordLanguage::default())
    }
}

impl Tokenizer {
    pub fn new(language: StopwordLanguage) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            language,
            stopwords: language.word_set(),
        }
    }

    pub fn language(&self) -> StopwordLanguage {
        self.language
    }

    /// Clean `text`, then split it on whitespace.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.normalizer
            .clean(text)
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    /// Order-preserving stopword filter.
    pub fn remove_stopwords(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .filter(|token| !self.stopwords.contains(token.as_str()))
            .cloned()
            .collect()
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}
