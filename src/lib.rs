//! commflow: business communication automation.
//!
//! A local, deterministic text preprocessing core (cleaning, tokens,
//! entities, lexicon sentiment, intent rules) wrapped around an injected
//! LLM for email replies, chatbot responses and report summaries, with
//! per-row isolated batch processing over JSON Lines tables.

pub mod analysis;
pub mod batch;
pub mod chatbot;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod preprocess;
pub mod reports;
