//! Text preprocessing: cleaning, tokenization, entities and sentiment.
//!
//! Everything here is local and deterministic except entity recognition,
//! which sits behind the `EntityRecognizer` trait.

pub mod entities;
pub mod normalizer;
pub mod pipeline;
pub mod sentiment;
pub mod stopwords;
pub mod tokenizer;

pub use entities::{Entity, EntityExtractor, EntityRecognizer, PatternRecognizer};
pub use normalizer::TextNormalizer;
pub use pipeline::{PreprocessingPipeline, PreprocessingResult};
pub use sentiment::{SentimentLabel, SentimentResult, SentimentScorer};
pub use stopwords::StopwordLanguage;
pub use tokenizer::Tokenizer;
