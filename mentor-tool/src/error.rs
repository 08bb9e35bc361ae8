use thiserror::Error;

use crate::store::AnyStoreError;

#[derive(Debug, Error)]
pub enum MentorError {
    #[error("API key not found. Set OPENAI_API_KEY or configure ~/.config/mentor/config.toml")]
    ApiKeyNotFound,

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] AnyStoreError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] mentor_core::ConversationError),

    #[error("Empty question")]
    EmptyQuestion,
}
