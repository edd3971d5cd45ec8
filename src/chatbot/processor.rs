//! Business chatbot: intent-aware replies over a bounded history.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use super::conversation::{ConversationState, Turn, render_transcript};
use super::intent::{IntentClassifier, IntentResult};
use crate::analysis::{ConversationAnalysis, parse_conversation_analysis};
use crate::config::ChatbotConfig;
use crate::error::PipelineError;
use crate::llm::Generator;

/// Reply used when the model could not produce a chat response.
pub const CHAT_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request right now. How else can I assist you?";

/// Reply used when a business inquiry could not be answered.
pub const INQUIRY_APOLOGY: &str = "I apologize, but I'm having trouble processing your business inquiry right now. Please try again later or contact our support team for assistance.";

/// One chatbot session. Owns its conversation state exclusively.
pub struct Chatbot {
    generator: Generator,
    classifier: IntentClassifier,
    state: ConversationState,
    config: ChatbotConfig,
}

impl Chatbot {
    pub fn new(generator: Generator, classifier: IntentClassifier, config: ChatbotConfig) -> Self {
        info!(
            model = generator.model_name(),
            max_history = config.max_history,
            "Chatbot initialized"
        );
        Self {
            generator,
            classifier,
            state: ConversationState::new(config.max_history),
            config,
        }
    }

    pub fn config(&self) -> &ChatbotConfig {
        &self.config
    }

    pub fn detect_intent(&self, user_input: &str) -> IntentResult {
        self.classifier.detect_intent(user_input)
    }

    /// Reply to `user_input`. Always returns a reply; a generation failure
    /// yields [`CHAT_APOLOGY`], which is also recorded as the assistant turn.
    pub async fn generate_response(&mut self, user_input: &str) -> String {
        self.state.append(Turn::user(user_input));

        let intent = self.classifier.detect_intent(user_input);
        let prompt = response_prompt(&self.state.transcript(), &intent);

        let reply = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(session = %self.state.id(), error = %e, "Error generating chat response");
                CHAT_APOLOGY.to_string()
            }
        };

        self.state.append(Turn::assistant(reply.clone()));
        debug!(
            session = %self.state.id(),
            intent = %intent.intent,
            turns = self.state.len(),
            "Chat turn complete"
        );
        reply
    }

    /// Answer a one-off business inquiry. Does not touch the conversation.
    pub async fn handle_business_inquiry(
        &self,
        inquiry: &str,
        context: Option<&BTreeMap<String, String>>,
    ) -> String {
        let prompt = inquiry_prompt(inquiry, context);
        match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Error handling business inquiry");
                INQUIRY_APOLOGY.to_string()
            }
        }
    }

    /// Ask the model for topics, sentiment, action items and satisfaction.
    pub async fn analyze_conversation(
        &self,
        turns: &[Turn],
    ) -> Result<ConversationAnalysis, PipelineError> {
        let prompt = analysis_prompt(&render_transcript(turns));
        let reply = self.generator.generate(&prompt).await?;
        parse_conversation_analysis(&reply)
    }

    pub fn history(&self) -> &[Turn] {
        self.state.snapshot()
    }

    pub fn clear_history(&mut self) {
        self.state.clear();
        info!(session = %self.state.id(), "Conversation history cleared");
    }
}

fn response_prompt(history: &str, intent: &IntentResult) -> String {
    format!(
        "You are an AI assistant for business communication. Respond to the following user message:\n\n\
         Conversation history:\n\
         {history}\n\
         User intent: {intent}\n\n\
         Your response should be helpful, concise, and professional. If you don't know the answer, \
         acknowledge that and offer to help with something else.",
        intent = intent.intent
    )
}

fn inquiry_prompt(inquiry: &str, context: Option<&BTreeMap<String, String>>) -> String {
    let context_text = match context {
        Some(context) if !context.is_empty() => {
            let lines: String = context
                .iter()
                .map(|(key, value)| format!("- {key}: {value}\n"))
                .collect();
            format!("Business context:\n{lines}")
        }
        _ => String::new(),
    };

    format!(
        "You are a business assistant. Respond to the following business inquiry with accurate information:\n\n\
         Inquiry: {inquiry}\n\n\
         {context_text}\n\
         Your response should be professional, informative, and actionable."
    )
}

fn analysis_prompt(transcript: &str) -> String {
    format!(
        "Analyze the following conversation between a user and an AI assistant.\n\
         Identify key topics, sentiment, and potential action items.\n\n\
         Conversation:\n\
         {transcript}\n\
         Return ONLY a JSON object with the following fields:\n\
         - \"topics\": list of main topics discussed\n\
         - \"sentiment\": overall sentiment (positive, negative, neutral)\n\
         - \"action_items\": list of potential action items\n\
         - \"satisfaction\": estimated user satisfaction (high, medium, low)"
    )
}
