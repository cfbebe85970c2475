use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gemini_interpreter::app::AiService;
use gemini_interpreter::config::DEFAULT_MODEL;
use gemini_interpreter::models::{
    CallMeta, ChatRequest, ClassificationRequest, Reply, SentimentRequest, SummaryRequest,
    SummaryStyle,
};
use gemini_interpreter::pipeline::{ExtractionMode, Interpreter};
use gemini_interpreter::{Error, UseCase};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-interpreter")]
#[command(about = "Turn Gemini completions into typed results")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Live(LiveCommand),
    /// Interpret a saved raw response without calling the API.
    Interpret {
        /// chat, sentiment, summary or classification
        #[arg(long)]
        use_case: UseCase,
        /// File holding the raw `generateContent` response body.
        #[arg(long)]
        file: PathBuf,
        /// Original text (sentiment) or product name (classification).
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Use brace-balanced payload extraction instead of the flat-object match.
        #[arg(long)]
        balanced: bool,
    },
}

/// Subcommands that call the Gemini API.
#[derive(Debug, Subcommand)]
enum LiveCommand {
    /// Ask a free-form question.
    Chat {
        #[arg(long)]
        message: String,
        #[arg(long)]
        context: Option<String>,
    },
    /// Classify the sentiment of a text.
    Sentiment {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "pt")]
        language: String,
    },
    /// Summarize a text.
    Summary {
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 3)]
        max_sentences: u32,
        /// conciso, detalhado or bullet-points
        #[arg(long, default_value = "conciso", value_parser = parse_style)]
        style: SummaryStyle,
    },
    /// Classify a product by tangibility.
    Classify {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

fn parse_style(input: &str) -> std::result::Result<SummaryStyle, String> {
    Ok(SummaryStyle::parse(input))
}

/// Print the reply as JSON and report whether it was a success.
fn emit<T: Serialize>(reply: Reply<T>) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(reply.is_success())
}

async fn run_live(command: LiveCommand) -> Result<bool> {
    let service = AiService::from_env().context("Failed to initialize service")?;

    match command {
        LiveCommand::Chat { message, context } => {
            let request = ChatRequest { message, context };
            emit(service.chat(&request).await.into())
        }
        LiveCommand::Sentiment { text, language } => {
            let request = SentimentRequest { text, language };
            emit(service.analyze_sentiment(&request).await.into())
        }
        LiveCommand::Summary {
            text,
            max_sentences,
            style,
        } => {
            let request = SummaryRequest {
                text,
                max_sentences,
                style,
            };
            emit(service.summarize(&request).await.into())
        }
        LiveCommand::Classify {
            name,
            description,
            category,
        } => {
            let request = ClassificationRequest {
                product_name: name,
                description,
                category,
            };
            emit(service.classify_product(&request).await.into())
        }
    }
}

fn run_offline(
    use_case: UseCase,
    file: PathBuf,
    subject: String,
    model: String,
    balanced: bool,
) -> Result<bool> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mode = if balanced {
        ExtractionMode::Balanced
    } else {
        ExtractionMode::FirstFlatObject
    };
    let interpreter = Interpreter::new().with_extraction_mode(mode);
    let meta = CallMeta::now(model);

    match use_case {
        UseCase::Chat => {
            let request = ChatRequest {
                message: subject,
                context: None,
            };
            emit(Reply::from(
                interpreter
                    .interpret_chat(&raw, &request, &meta)
                    .map_err(Error::from),
            ))
        }
        UseCase::Sentiment => {
            let request = SentimentRequest::new(subject);
            emit(Reply::from(
                interpreter
                    .interpret_sentiment(&raw, &request, &meta)
                    .map_err(Error::from),
            ))
        }
        UseCase::Summary => {
            let request = SummaryRequest {
                text: subject,
                max_sentences: 3,
                style: SummaryStyle::default(),
            };
            emit(Reply::from(
                interpreter
                    .interpret_summary(&raw, &request, &meta)
                    .map_err(Error::from),
            ))
        }
        UseCase::Classification => {
            let request = ClassificationRequest::new(subject);
            emit(Reply::from(
                interpreter
                    .interpret_classification(&raw, &request, &meta)
                    .map_err(Error::from),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_interpreter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let outcome = match args.command {
        Command::Interpret {
            use_case,
            file,
            subject,
            model,
            balanced,
        } => run_offline(use_case, file, subject, model, balanced),
        Command::Live(command) => run_live(command).await,
    };

    match outcome {
        Ok(true) => {
            info!("Request completed successfully");
            Ok(())
        }
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Request failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
