//! Chatbot: intent rules, conversation state and the session processor.

pub mod conversation;
pub mod intent;
pub mod processor;

pub use conversation::{ConversationState, Turn, TurnRole, render_transcript};
pub use intent::{Intent, IntentClassifier, IntentResult, IntentRule, IntentRules, RuleMatch};
pub use processor::{CHAT_APOLOGY, Chatbot, INQUIRY_APOLOGY};
