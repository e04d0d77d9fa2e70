//! `wikirag`: ask questions about the WikiRAG-TR corpus.
//!
//! With no arguments, starts an interactive session: one question per line,
//! a blank line (or Ctrl-C / end of input) ends it. With `--question`, answers
//! once and exits.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikirag_ai::RagSession;
use wikirag_core::config::Settings;
use wikirag_core::domain::{AnswerResult, PromptLanguage};
use wikirag_core::error::AppError;
use wikirag_core::present::format_answer;

const FAREWELL: &str = "[+] See you soon!";

/// Conversational question answering over a Wikipedia-derived corpus.
///
/// Configuration comes from the environment (`GOOGLE_API_KEY` is required);
/// flags override it.
#[derive(Debug, Parser)]
#[command(name = "wikirag", version)]
struct Cli {
    /// Answer a single question and exit.
    #[arg(short, long)]
    question: Option<String>,

    /// Print the single-shot result as JSON.
    #[arg(long, requires = "question")]
    json: bool,

    /// Chat model to use instead of automatic selection.
    #[arg(long)]
    model: Option<String>,

    /// Directory of the persisted index.
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Local `.jsonl`/`.csv` corpus used instead of the remote dataset.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Prompt language: `en` or `tr`.
    #[arg(long)]
    lang: Option<String>,

    /// Maximum conversation turns kept in memory (0 = unbounded).
    #[arg(long)]
    history_limit: Option<usize>,
}

impl Cli {
    fn apply(&self, mut settings: Settings) -> Result<Settings, AppError> {
        if let Some(model) = &self.model {
            settings.chat_model_override = Some(model.clone());
        }
        if let Some(dir) = &self.index_dir {
            settings.index_dir = dir.clone();
        }
        if let Some(path) = &self.corpus {
            settings.corpus_path = Some(path.clone());
        }
        if let Some(raw) = &self.lang {
            settings.language = PromptLanguage::parse(raw).ok_or_else(|| {
                AppError::new("CONFIG_INVALID", "Unsupported prompt language")
                    .with_details(format!("--lang {raw}; expected en|tr"))
            })?;
        }
        if let Some(limit) = self.history_limit {
            settings.history_limit = (limit > 0).then_some(limit);
        }
        Ok(settings)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikirag=info,wikirag_ai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn io_failed(e: io::Error) -> AppError {
    AppError::new("CONSOLE_IO_FAILED", "Console I/O failed").with_details(e.to_string())
}

fn model_banner(chat_model: &str) -> String {
    format!("[i] Using chat model: {chat_model}\n")
}

/// Single-shot output: the model banner plus the formatted answer, or bare
/// JSON so the output stays machine-readable.
fn render_single_shot(
    chat_model: &str,
    result: &AnswerResult,
    json: bool,
) -> Result<String, AppError> {
    if json {
        let encoded = serde_json::to_string_pretty(result).map_err(|e| {
            AppError::new("CONSOLE_IO_FAILED", "Failed to encode result")
                .with_details(e.to_string())
        })?;
        return Ok(format!("{encoded}\n"));
    }
    Ok(format!("{}{}", model_banner(chat_model), format_answer(result)))
}

fn interactive_loop(session: &RagSession) -> Result<(), AppError> {
    let mut pipeline = session.pipeline();
    print!("{}", model_banner(pipeline.chat_model()));

    ctrlc::set_handler(|| {
        tracing::debug!("interrupted");
        println!("\n\n{FAREWELL}");
        std::process::exit(0);
    })
    .map_err(|e| {
        AppError::new("CONSOLE_IO_FAILED", "Failed to install interrupt handler")
            .with_details(e.to_string())
    })?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("\n>>> ");
        io::stdout().flush().map_err(io_failed)?;

        line.clear();
        if stdin.lock().read_line(&mut line).map_err(io_failed)? == 0 {
            tracing::debug!("end of input");
            println!("\n\n{FAREWELL}");
            return Ok(());
        }
        let question = line.trim();
        if question.is_empty() {
            tracing::debug!(turns = pipeline.memory().total_turns(), "blank line, session over");
            return Ok(());
        }

        let result = pipeline.answer(question)?;
        print!("{}", format_answer(&result));
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let settings = cli.apply(Settings::from_env()?)?;
    let session = RagSession::from_settings(settings)?;

    match &cli.question {
        None => interactive_loop(&session),
        Some(question) => {
            let result = session.answer_once(question)?;
            print!("{}", render_single_shot(session.chat_model(), &result, cli.json)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = %e.code, retryable = e.retryable, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
