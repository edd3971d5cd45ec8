//! Row handlers for the email, conversation and report batches.

use async_trait::async_trait;
use tracing::debug;

use super::orchestrator::{RowFailure, RowHandler};
use super::table::BatchRow;
use crate::chatbot::Chatbot;
use crate::email::EmailAutomation;
use crate::reports::{ReportSummarizer, report_text};

pub const SUBJECT: &str = "Subject";
pub const EMAIL_BODY: &str = "Email_Body";
pub const SENDER: &str = "Sender";
pub const PREDICTED_CATEGORY: &str = "Predicted_Category";
pub const GENERATED_REPLY: &str = "Generated_Reply";

pub const USER_INPUT: &str = "User_Input";
pub const GENERATED_RESPONSE: &str = "Generated_Response";

pub const SUMMARY: &str = "Summary";
pub const KEY_FINDINGS: &str = "Key_Findings";
pub const GENERATED_SUMMARY: &str = "Generated_Summary";

/// Categorizes each email, then drafts a reply for that category.
///
/// A failed reply still keeps the predicted category.
pub struct EmailRowHandler {
    email: EmailAutomation,
}

impl EmailRowHandler {
    pub fn new(email: EmailAutomation) -> Self {
        Self { email }
    }
}

#[async_trait]
impl RowHandler for EmailRowHandler {
    fn kind(&self) -> &str {
        "email"
    }

    fn output_columns(&self) -> Vec<String> {
        vec![PREDICTED_CATEGORY.into(), GENERATED_REPLY.into()]
    }

    async fn handle(&mut self, row: &BatchRow) -> Result<Vec<(String, String)>, RowFailure> {
        let subject = row.get(SUBJECT);
        let body = row.get(EMAIL_BODY);
        let sender = row.get(SENDER);

        let category = self.email.categorize_email(subject, body).await;
        let reply = self
            .email
            .try_generate_reply(subject, body, sender, Some(&category))
            .await;

        match reply {
            Ok(reply) => Ok(vec![
                (PREDICTED_CATEGORY.into(), category),
                (GENERATED_REPLY.into(), reply),
            ]),
            Err(e) => Err(RowFailure::with_completed(
                vec![(PREDICTED_CATEGORY.into(), category)],
                e,
            )),
        }
    }
}

/// Answers each `User_Input` as the opening turn of a fresh conversation.
///
/// A generation failure still produces the chatbot's apology, so
/// conversation rows only fail on errors outside the chatbot.
pub struct ConversationRowHandler {
    chatbot: Chatbot,
}

impl ConversationRowHandler {
    pub fn new(chatbot: Chatbot) -> Self {
        Self { chatbot }
    }

    pub fn chatbot(&self) -> &Chatbot {
        &self.chatbot
    }
}

#[async_trait]
impl RowHandler for ConversationRowHandler {
    fn kind(&self) -> &str {
        "conversation"
    }

    fn output_columns(&self) -> Vec<String> {
        vec![GENERATED_RESPONSE.into()]
    }

    fn reset(&mut self) {
        self.chatbot.clear_history();
    }

    async fn handle(&mut self, row: &BatchRow) -> Result<Vec<(String, String)>, RowFailure> {
        let response = self.chatbot.generate_response(row.get(USER_INPUT)).await;
        Ok(vec![(GENERATED_RESPONSE.into(), response)])
    }
}

/// Summarizes each report's `Summary` and `Key_Findings`.
///
/// A report with neither gets an empty summary without a model call.
pub struct ReportRowHandler {
    summarizer: ReportSummarizer,
}

impl ReportRowHandler {
    pub fn new(summarizer: ReportSummarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl RowHandler for ReportRowHandler {
    fn kind(&self) -> &str {
        "report"
    }

    fn output_columns(&self) -> Vec<String> {
        vec![GENERATED_SUMMARY.into()]
    }

    async fn handle(&mut self, row: &BatchRow) -> Result<Vec<(String, String)>, RowFailure> {
        let text = report_text(row.get(SUMMARY), row.get(KEY_FINDINGS));
        if text.is_empty() {
            debug!("Report has no summary or key findings, leaving summary empty");
            return Ok(vec![(GENERATED_SUMMARY.into(), String::new())]);
        }
        let summary = self.summarizer.try_summarize_report(&text).await?;
        Ok(vec![(GENERATED_SUMMARY.into(), summary)])
    }
}
