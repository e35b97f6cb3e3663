//! WhoQA command-line answerer
//!
//! Usage:
//! - `answer` answers the sample questions from the free-text ranking
//! - `answer ask <free_text|structured|hybrid> <question...>`
//! - `answer evaluate <qa_pairs.json>`

use tracing::info;
use tracing_subscriber::EnvFilter;
use whoqa_answer::evaluation::{self, TOP_K};
use whoqa_answer::{Answer, AnswerSource, Answerer, SAMPLE_QUESTIONS};
use whoqa_common::{cache, config::AppConfig, errors::AppError, VERSION};

/// Ranked answers printed per question
const PRINTED_ANSWERS: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);
    info!("Starting WhoQA answerer v{}", VERSION);

    let cache = cache::connect(&config.redis).await;
    let answerer = Answerer::from_config(&config, cache)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            for question in SAMPLE_QUESTIONS {
                pretty_answer(&answerer, question, AnswerSource::FreeText).await?;
            }
        }
        Some("ask") if args.len() >= 3 => {
            let source: AnswerSource = args[1].parse()?;
            let question = args[2..].join(" ");
            pretty_answer(&answerer, &question, source).await?;
        }
        Some("evaluate") if args.len() == 2 => {
            answerer.require_search()?;
            let pairs = evaluation::load_qa_pairs(&args[1]).await?;
            println!("Generating candidate answers for {} questions", pairs.len());
            let report = evaluation::evaluate(answerer.free_text(), &pairs).await;
            println!("{} had a correct answer in the top {}", report.okay, TOP_K);
            println!("{} returned a perfect answer", report.perfect);
            if report.failed > 0 {
                println!("{} could not be answered", report.failed);
            }
        }
        Some(other) => {
            return Err(AppError::Validation {
                message: format!(
                    "unrecognized command '{}'; expected `ask <source> <question>` or `evaluate <file>`",
                    other
                ),
                field: None,
            }
            .into());
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Print a question followed by its answer(s)
async fn pretty_answer(
    answerer: &Answerer,
    question: &str,
    source: AnswerSource,
) -> Result<(), AppError> {
    println!("\nQ: {}", question);
    match answerer.answer(question, source).await? {
        Answer::Ranked(ranked) => {
            for (rank, answer) in ranked.iter().take(PRINTED_ANSWERS).enumerate() {
                println!("{}. {} ({})", rank + 1, answer.text, answer.score);
            }
        }
        Answer::Single(Some(answer)) => println!("{}", answer),
        Answer::Single(None) => println!("No answer returned"),
    }
    Ok(())
}
