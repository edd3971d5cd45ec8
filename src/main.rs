use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use commflow::batch::dataset::{prepare_chatbot_dataset, prepare_email_dataset, prepare_report_dataset};
use commflow::batch::handlers::{EMAIL_BODY, SUMMARY, USER_INPUT};
use commflow::batch::{
    BatchOrchestrator, BatchReport, ConversationRowHandler, EmailRowHandler, ReportRowHandler, Table,
};
use commflow::chatbot::{Chatbot, IntentClassifier, IntentRules};
use commflow::config::AppConfig;
use commflow::email::EmailAutomation;
use commflow::llm::{Generator, create_provider};
use commflow::preprocess::{EntityExtractor, PreprocessingPipeline, SentimentScorer, Tokenizer};
use commflow::reports::ReportSummarizer;

const USAGE: &str = "usage: commflow <emails|conversations|reports|preprocess> <input.jsonl> [output.jsonl]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Emails,
    Conversations,
    Reports,
    Preprocess,
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "emails" => Some(Self::Emails),
            "conversations" => Some(Self::Conversations),
            "reports" => Some(Self::Reports),
            "preprocess" => Some(Self::Preprocess),
            _ => None,
        }
    }
}

/// stderr for humans, plus a daily file under `COMMFLOW_LOG_DIR` when set.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = None;
    let file_layer = std::env::var("COMMFLOW_LOG_DIR").ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "commflow.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        fmt::layer().with_ansi(false).with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, input, output) = match args.as_slice() {
        [command, input] => (command, PathBuf::from(input), None),
        [command, input, output] => (command, PathBuf::from(input), Some(PathBuf::from(output))),
        _ => bail!(USAGE),
    };
    let command = Command::parse(command).with_context(|| format!("unknown command\n{USAGE}"))?;

    let config = AppConfig::from_env();
    let table = Table::load_jsonl(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let pipeline = PreprocessingPipeline::new(
        Tokenizer::default(),
        EntityExtractor::default(),
        SentimentScorer::new(Tokenizer::default(), &config.sentiment),
    );

    let orchestrator = BatchOrchestrator::new();
    let report = match command {
        Command::Preprocess => return preprocess(&table, &pipeline, output.as_deref()),
        Command::Emails => {
            let email = EmailAutomation::new(build_generator(&config)?, pipeline, config.email.clone());
            let mut handler = EmailRowHandler::new(email);
            orchestrator
                .process_batch(&prepare_email_dataset(&table), &mut handler)
                .await
        }
        Command::Conversations => {
            let classifier =
                IntentClassifier::new(IntentRules::from_config(&config.intent), pipeline);
            let chatbot = Chatbot::new(build_generator(&config)?, classifier, config.chatbot.clone());
            let mut handler = ConversationRowHandler::new(chatbot);
            orchestrator
                .process_batch(&prepare_chatbot_dataset(&table), &mut handler)
                .await
        }
        Command::Reports => {
            let summarizer = ReportSummarizer::new(build_generator(&config)?);
            let mut handler = ReportRowHandler::new(summarizer);
            orchestrator
                .process_batch(&prepare_report_dataset(&table), &mut handler)
                .await
        }
    };

    write_table(&report.table, output.as_deref())?;
    print_summary(&report);
    Ok(())
}

fn build_generator(config: &AppConfig) -> anyhow::Result<Generator> {
    let llm = create_provider(config.require_llm()?)?;
    Ok(Generator::new(llm, config.generation))
}

/// One `PreprocessingResult` per row, for the row's main text column.
fn preprocess(
    table: &Table,
    pipeline: &PreprocessingPipeline,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(column) = [EMAIL_BODY, USER_INPUT, SUMMARY]
        .into_iter()
        .find(|c| table.has_column(c))
    else {
        bail!("input has none of the columns {EMAIL_BODY}, {USER_INPUT}, {SUMMARY}");
    };

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    for row in table.rows() {
        let result = pipeline.process(row.get(column));
        serde_json::to_writer(&mut out, &result)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    eprintln!("Preprocessed {} rows from column {column}", table.len());
    Ok(())
}

fn write_table(table: &Table, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => table
            .save_jsonl(path)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => table.write_jsonl(std::io::stdout().lock())?,
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    eprintln!(
        "Processed {} rows: {} succeeded, {} failed ({} ms)",
        report.outcomes.len(),
        report.succeeded(),
        report.failed(),
        report.elapsed_ms()
    );
    for outcome in report.failures() {
        eprintln!("  row {}: {:?}", outcome.row() + 1, outcome);
    }
}
