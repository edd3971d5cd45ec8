//! Email automation: categorization, replies and follow-ups.
//!
//! Every public operation that talks to the model has a total form that
//! always returns a string and, where the batch layer needs to see the
//! failure, a `try_` form returning the error instead.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::analysis::{ModelSentiment, parse_model_sentiment};
use crate::config::EmailConfig;
use crate::error::PipelineError;
use crate::llm::Generator;
use crate::preprocess::{Entity, PreprocessingPipeline, SentimentResult};

/// One message of an email thread. Missing fields render with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEmail {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ThreadEmail {
    pub fn new(sender: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            subject: Some(subject.into()),
            body: Some(body.into()),
        }
    }
}

pub struct EmailAutomation {
    generator: Generator,
    pipeline: PreprocessingPipeline,
    config: EmailConfig,
}

impl EmailAutomation {
    pub fn new(generator: Generator, pipeline: PreprocessingPipeline, config: EmailConfig) -> Self {
        info!(
            model = generator.model_name(),
            categories = ?config.categories,
            "Email automation initialized"
        );
        Self {
            generator,
            pipeline,
            config,
        }
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Pick one of the configured categories.
    ///
    /// The trimmed reply must equal a category, ignoring case. Anything else,
    /// including a generation failure, yields the first configured category.
    pub async fn categorize_email(&self, subject: &str, body: &str) -> String {
        let fallback = self.config.fallback_category();
        let prompt = format!(
            "Categorize the following email into one of these categories: {categories}\n\n\
             Subject: {subject}\n\
             Body: {body}\n\n\
             Return only the category name.",
            categories = self.config.categories.join(", ")
        );

        let reply = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Error categorizing email");
                return fallback.to_string();
            }
        };

        match self.match_category(&reply) {
            Some(category) => category.to_string(),
            None => {
                warn!(
                    reply = %reply.trim(),
                    fallback,
                    "Category not recognized, using fallback"
                );
                fallback.to_string()
            }
        }
    }

    fn match_category(&self, reply: &str) -> Option<&str> {
        let reply = reply.trim();
        self.config
            .categories
            .iter()
            .find(|c| c.as_str() == reply)
            .or_else(|| {
                self.config
                    .categories
                    .iter()
                    .find(|c| c.to_lowercase() == reply.to_lowercase())
            })
            .map(String::as_str)
    }

    /// Draft a reply. Failure yields `"Error generating reply: {e}"`.
    pub async fn generate_reply(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
        category: Option<&str>,
    ) -> String {
        match self.try_generate_reply(subject, body, sender, category).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Error generating email reply");
                format!("Error generating reply: {e}")
            }
        }
    }

    /// Draft a reply, categorizing first when no category is given.
    pub async fn try_generate_reply(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
        category: Option<&str>,
    ) -> Result<String, PipelineError> {
        let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => category.to_string(),
            None => self.categorize_email(subject, body).await,
        };

        let analysis = self.pipeline.run(body, true);
        let entity_text = render_entities(&analysis.entities, self.config.max_prompt_entities);

        let prompt = format!(
            "Generate a professional email reply to the following email:\n\n\
             From: {sender}\n\
             Subject: {subject}\n\
             Body: {body}\n\n\
             Additional information:\n\
             - Email category: {category}\n\
             - Sentiment: {sentiment}\n\
             - Key entities: {entity_text}\n\n\
             The reply should be professional, concise, and address the specific points in the email.\n\
             If the email is a question, provide a helpful answer.\n\
             If the email is a request, acknowledge it and provide next steps.",
            sentiment = analysis.sentiment.label
        );

        Ok(self.generator.generate(&prompt).await?)
    }

    /// Suggest the next email of a thread. Failure yields `"Error suggesting follow-up: {e}"`.
    pub async fn suggest_follow_up(&self, thread: &[ThreadEmail]) -> String {
        let prompt = format!(
            "Based on the following email thread, suggest a follow-up email:\n\n\
             {thread}\
             The follow-up should be professional, concise, and move the conversation forward.",
            thread = render_thread(thread)
        );

        match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Error suggesting follow-up");
                format!("Error suggesting follow-up: {e}")
            }
        }
    }

    /// Local lexicon score of the body. No model call.
    pub fn analyze_email_sentiment(&self, body: &str) -> SentimentResult {
        self.pipeline.scorer().score(body)
    }

    /// Ask the model for `{sentiment, confidence, tone}`.
    pub async fn analyze_sentiment_with_model(
        &self,
        text: &str,
    ) -> Result<ModelSentiment, PipelineError> {
        let prompt = format!(
            "Analyze the sentiment of the following text and return ONLY a JSON object with:\n\
             - \"sentiment\": positive, negative, or neutral\n\
             - \"confidence\": a number between 0 and 1\n\
             - \"tone\": formal, informal, friendly, urgent, etc.\n\n\
             Text: {text}"
        );
        let reply = self.generator.generate(&prompt).await?;
        parse_model_sentiment(&reply)
    }
}

/// `text (LABEL)` for the first `limit` entities, comma separated.
fn render_entities(entities: &[Entity], limit: usize) -> String {
    entities
        .iter()
        .take(limit)
        .map(|e| format!("{} ({})", e.text, e.label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_thread(thread: &[ThreadEmail]) -> String {
    thread
        .iter()
        .enumerate()
        .map(|(i, email)| {
            format!(
                "Email {n}:\nFrom: {from}\nSubject: {subject}\nBody: {body}\n\n",
                n = i + 1,
                from = email.sender.as_deref().unwrap_or("Unknown"),
                subject = email.subject.as_deref().unwrap_or("No Subject"),
                body = email.body.as_deref().unwrap_or(""),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GenerationConfig;
    use crate::llm::LlmProvider;
    use crate::llm::mock::{FailingLlm, FixedLlm, RecordingLlm, ScriptedLlm};
    use crate::preprocess::SentimentLabel;

    fn automation(llm: Arc<dyn LlmProvider>) -> EmailAutomation {
        EmailAutomation::new(
            Generator::new(llm, GenerationConfig::default()),
            PreprocessingPipeline::default(),
            EmailConfig::default(),
        )
    }

    #[tokio::test]
    async fn categorize_accepts_exact_category() {
        let email = automation(Arc::new(FixedLlm::new("  Support\n")));
        assert_eq!(email.categorize_email("Login broken", "I cannot log in").await, "Support");
    }

    #[tokio::test]
    async fn categorize_accepts_other_casing() {
        let email = automation(Arc::new(FixedLlm::new("finance")));
        assert_eq!(email.categorize_email("Invoice", "Attached").await, "Finance");
    }

    #[tokio::test]
    async fn categorize_falls_back_on_unknown_reply() {
        let email = automation(Arc::new(FixedLlm::new("The category is Meeting.")));
        assert_eq!(email.categorize_email("Sync", "Let's meet").await, "Business");
    }

    #[tokio::test]
    async fn categorize_falls_back_on_failure() {
        let email = automation(Arc::new(FailingLlm));
        assert_eq!(email.categorize_email("Sync", "Let's meet").await, "Business");
    }

    #[tokio::test]
    async fn categorize_prompt_lists_categories() {
        let llm = Arc::new(RecordingLlm::new("Meeting"));
        let email = automation(llm.clone());
        email.categorize_email("Sync", "Let's meet").await;
        assert!(llm.prompts()[0].contains("Business, Support, Meeting, Finance"));
    }

    #[tokio::test]
    async fn reply_prompt_carries_analysis() {
        let llm = Arc::new(RecordingLlm::new("Dear Jane, ..."));
        let email = automation(llm.clone());
        let reply = email
            .generate_reply(
                "Refund",
                "I was happy with the service but please refund $40.00 by 2024-05-01.",
                "jane@example.com",
                Some("Finance"),
            )
            .await;
        assert_eq!(reply, "Dear Jane, ...");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1, "category given, no categorization call");
        let prompt = &prompts[0];
        assert!(prompt.contains("From: jane@example.com"));
        assert!(prompt.contains("- Email category: Finance"));
        assert!(prompt.contains("- Sentiment: positive"));
        assert!(prompt.contains("- Key entities: $40.00 (MONEY), 2024-05-01 (DATE)"));
    }

    #[tokio::test]
    async fn reply_categorizes_when_category_missing() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Support"), Ok("Thanks for reaching out")]));
        let email = automation(llm);
        let reply = email.generate_reply("Help", "It crashed", "bob@example.com", None).await;
        assert_eq!(reply, "Thanks for reaching out");
    }

    #[tokio::test]
    async fn reply_entities_are_capped() {
        let llm = Arc::new(RecordingLlm::new("ok"));
        let email = automation(llm.clone());
        let body = "a@x.io b@x.io c@x.io d@x.io e@x.io f@x.io g@x.io";
        email.generate_reply("List", body, "z@x.io", Some("Business")).await;
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("e@x.io (EMAIL)"));
        assert!(!prompt.contains("f@x.io (EMAIL)"));
    }

    #[tokio::test]
    async fn reply_failure_yields_error_string() {
        let email = automation(Arc::new(FailingLlm));
        let reply = email.generate_reply("Hi", "Body", "x@y.z", Some("Business")).await;
        assert!(reply.starts_with("Error generating reply: "));
        assert!(reply.contains("connection refused"));

        let err = email
            .try_generate_reply("Hi", "Body", "x@y.z", Some("Business"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }

    #[tokio::test]
    async fn follow_up_renders_thread_with_defaults() {
        let llm = Arc::new(RecordingLlm::new("Following up..."));
        let email = automation(llm.clone());
        let thread = vec![
            ThreadEmail::new("ann@acme.io", "Proposal", "Please review."),
            ThreadEmail {
                body: Some("Any update?".into()),
                ..ThreadEmail::default()
            },
        ];
        assert_eq!(email.suggest_follow_up(&thread).await, "Following up...");

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Email 1:\nFrom: ann@acme.io\nSubject: Proposal\nBody: Please review.\n\n"));
        assert!(prompt.contains("Email 2:\nFrom: Unknown\nSubject: No Subject\nBody: Any update?\n\n"));
    }

    #[tokio::test]
    async fn follow_up_failure_yields_error_string() {
        let email = automation(Arc::new(FailingLlm));
        let reply = email.suggest_follow_up(&[]).await;
        assert!(reply.starts_with("Error suggesting follow-up: "));
    }

    #[test]
    fn local_sentiment() {
        let email = automation(Arc::new(FailingLlm));
        let result = email.analyze_email_sentiment("Terrible. Bad service, poor support.");
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn model_sentiment_is_parsed() {
        let email = automation(Arc::new(FixedLlm::new(
            r#"{"sentiment": "neutral", "confidence": 0.65, "tone": "formal"}"#,
        )));
        let parsed = email.analyze_sentiment_with_model("Please find attached.").await.unwrap();
        assert_eq!(parsed.sentiment, SentimentLabel::Neutral);
        assert_eq!(parsed.confidence, 0.65);
        assert_eq!(parsed.tone, "formal");
    }

    #[test]
    fn thread_email_deserializes_with_missing_fields() {
        let email: ThreadEmail = serde_json::from_str(r#"{"subject": "Hi"}"#).unwrap();
        assert_eq!(email.sender, None);
        assert_eq!(email.subject.as_deref(), Some("Hi"));
    }
}
