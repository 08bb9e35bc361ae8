mod config;
mod error;
mod speech;
mod store;

#[cfg(feature = "chat")]
mod chat;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use mentor_core::{
    CompletionClient, Conversation, HistoryStore, Language, NoopSpeech, RemoteError, Sender,
};
use mentor_openai::OpenAiClient;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, load_api_key, load_config, log_path, resolve_store_config};
use crate::error::MentorError;
use crate::store::{AnyStore, StoreType};

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "AI career mentor in the terminal", long_about = None)]
struct Cli {
    /// Store type: fjall or memory
    #[arg(long, global = true)]
    store_type: Option<StoreType>,

    /// Path to the history store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[cfg(feature = "chat")]
    /// Start an interactive chat session
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Reply language: en, hi or fr
        #[arg(short, long)]
        language: Option<Language>,

        /// Start with spoken replies turned off
        #[arg(long)]
        no_voice: bool,
    },

    /// Ask a single question and print the reply
    Ask {
        question: Vec<String>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Reply language: en, hi or fr
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Print the saved conversation
    History,

    /// Reset the saved conversation to the welcome message
    Clear,
}

/// Completion client for commands that never ask for a reply.
struct Offline;

#[async_trait]
impl CompletionClient for Offline {
    async fn complete(&self, _utterance: &str, _instruction: &str) -> Result<String, RemoteError> {
        Err(RemoteError::new("no completion client configured"))
    }
}

fn init_tracing(log_to_file: bool) {
    let filter =
        EnvFilter::try_from_env("MENTOR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    if !log_to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    // The TUI owns the terminal, so logs go to a file or nowhere.
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

fn completion_client(config: &Config, model: Option<String>) -> Result<OpenAiClient, MentorError> {
    let api_key = load_api_key(config)?;
    let model = model.unwrap_or_else(|| config.model().to_string());

    Ok(OpenAiClient::with_base_url(api_key, config.base_url())
        .model(model)
        .params(config.generation_params()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "chat")]
    init_tracing(matches!(cli.command, Command::Chat { .. }));
    #[cfg(not(feature = "chat"))]
    init_tracing(false);

    let config = load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config");
        Config::default()
    });

    let (store_type, store_path) = resolve_store_config(&config, cli.store_type, cli.store);
    let store = AnyStore::open(store_type, &store_path).map_err(MentorError::from)?;
    let history = HistoryStore::with_key(store, config.history_key());

    match cli.command {
        #[cfg(feature = "chat")]
        Command::Chat {
            model,
            language,
            no_voice,
        } => {
            let client = completion_client(&config, model)?;
            let model = client.model_name().to_string();
            let speech = speech::speech_output(&config.speech.synthesizer).await;
            let recognizer = speech::recognizer(config.speech.recognizer.clone());

            let conversation = Conversation::new(history, Arc::new(client), speech);
            let settings = chat::Settings {
                model,
                language: language.unwrap_or(config.language()),
                voice_enabled: config.voice() && !no_voice,
            };

            chat::run(conversation, recognizer, settings).await?;
        }
        Command::Ask {
            question,
            model,
            language,
        } => {
            let question = question.join(" ");
            let question = question.trim();
            if question.is_empty() {
                return Err(MentorError::EmptyQuestion.into());
            }

            let client = completion_client(&config, model)?;
            let language = language.unwrap_or(config.language());
            let mut conversation =
                Conversation::new(history, Arc::new(client), Arc::new(NoopSpeech));

            conversation.add_message(question, Sender::User);
            let reply = conversation
                .request_reply(question, language, false)
                .await
                .map_err(MentorError::from)?;

            println!("{}", reply.content);
        }
        Command::History => {
            let conversation = Conversation::new(history, Arc::new(Offline), Arc::new(NoopSpeech));
            let now = Utc::now();

            for msg in conversation.messages() {
                println!("{} ({}):", msg.sender, msg.age(now));
                for line in msg.content.lines() {
                    println!("  {}", line);
                }
                println!();
            }
        }
        Command::Clear => {
            let mut conversation =
                Conversation::new(history, Arc::new(Offline), Arc::new(NoopSpeech));
            conversation.clear_messages();
            println!("Chat history cleared");
        }
    }

    Ok(())
}
