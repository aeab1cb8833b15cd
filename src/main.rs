//! Medical chat responder entry point.
//!
//! Initialises logging and all components from environment configuration and
//! runs an interactive REPL loop. Press Ctrl+C or type `/quit` to exit;
//! `/clear` resets the conversation window.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

mod chat;
mod classifier;
mod completion;
mod config;
mod context;
mod embedding;
mod error;
mod formatter;

use chat::ChatBot;
use classifier::DomainClassifier;
use completion::GroqClient;
use config::load_config;
use embedding::{EmbeddingProvider, OnnxEmbedding};

/// Log file written next to the console stream.
const LOG_FILE: &str = "medassist.log";

/// Initialise tracing with a console layer plus a timestamped file sink.
///
/// The returned guard must stay alive for the duration of the program so the
/// non-blocking file writer flushes on exit.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() {
    let _log_guard = init_logging();

    // Load configuration from .env / system environment.
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Please check your .env file. See .env.example for required variables.");
            std::process::exit(1);
        }
    };

    println!("🩺 Medical assistant starting...");
    println!("   Model:    {}", config.model);
    println!("   Endpoint: {}", config.api_base_url);

    // Embedder → classifier → completion client → orchestrator.
    let embedder: Arc<dyn EmbeddingProvider> =
        match OnnxEmbedding::new(&config.embedding_model_path) {
            Ok(e) => {
                tracing::info!("Embedding backend: {}", e.name());
                Arc::new(e)
            }
            Err(e) => {
                eprintln!("Embedding initialisation error: {}", e);
                std::process::exit(1);
            }
        };

    let classifier = DomainClassifier::from_file(Arc::clone(&embedder), &config.terms_path);
    if classifier.term_count() == 0 {
        eprintln!(
            "⚠️  No medical terms loaded from '{}' — all inputs will be rejected.",
            config.terms_path
        );
    }

    let client = GroqClient::new(&config);
    let mut bot = ChatBot::new(classifier, client);

    println!("💬 Type your message (Ctrl+C or /quit to exit, /clear to reset)\n");

    // REPL loop — one `handle` call per user input line.
    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush().unwrap_or_default();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let input = line.trim();
                if input == "/quit" || input == "/exit" {
                    break;
                }
                if input == "/clear" {
                    println!("\n{}\n", bot.clear());
                    continue;
                }

                let response = bot.handle(input).await;
                println!("\nAssistant: {}\n", response);
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }

    println!("\n👋 Goodbye!");
}
