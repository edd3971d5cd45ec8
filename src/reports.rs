//! Business report summarization.

use tracing::error;

use crate::error::PipelineError;
use crate::llm::Generator;

pub struct ReportSummarizer {
    generator: Generator,
}

impl ReportSummarizer {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    /// Summarize a report. Failure yields `"Error summarizing report: {e}"`.
    pub async fn summarize_report(&self, report_text: &str) -> String {
        match self.try_summarize_report(report_text).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Error summarizing report");
                format!("Error summarizing report: {e}")
            }
        }
    }

    pub async fn try_summarize_report(&self, report_text: &str) -> Result<String, PipelineError> {
        let prompt = format!(
            "Summarize the following business report, highlighting key insights, trends, and action items:\n\n\
             {report_text}"
        );
        Ok(self.generator.generate(&prompt).await?)
    }
}

/// Join a report's summary and findings into one text for summarization.
pub fn report_text(summary: &str, key_findings: &str) -> String {
    match (summary.trim().is_empty(), key_findings.trim().is_empty()) {
        (false, false) => format!("Summary: {summary}\n\nKey findings: {key_findings}"),
        (false, true) => format!("Summary: {summary}"),
        (true, false) => format!("Key findings: {key_findings}"),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GenerationConfig;
    use crate::llm::mock::{FailingLlm, RecordingLlm};

    #[tokio::test]
    async fn summary_prompt_embeds_report() {
        let llm = Arc::new(RecordingLlm::new("Revenue up, churn down."));
        let summarizer = ReportSummarizer::new(Generator::new(llm.clone(), GenerationConfig::default()));

        let summary = summarizer.summarize_report("Q3: revenue +12%, churn -3%").await;
        assert_eq!(summary, "Revenue up, churn down.");
        assert!(llm.prompts()[0].ends_with("Q3: revenue +12%, churn -3%"));
    }

    #[tokio::test]
    async fn failure_yields_error_string() {
        let summarizer = ReportSummarizer::new(Generator::new(Arc::new(FailingLlm), GenerationConfig::default()));
        let summary = summarizer.summarize_report("anything").await;
        assert!(summary.starts_with("Error summarizing report: "));
        assert!(summarizer.try_summarize_report("anything").await.is_err());
    }

    #[test]
    fn report_text_skips_empty_parts() {
        assert_eq!(report_text("Sales grew", "EU led"), "Summary: Sales grew\n\nKey findings: EU led");
        assert_eq!(report_text("Sales grew", " "), "Summary: Sales grew");
        assert_eq!(report_text("", "EU led"), "Key findings: EU led");
        assert_eq!(report_text("", ""), "");
    }
}
