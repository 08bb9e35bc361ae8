use async_trait::async_trait;

use crate::error::RemoteError;

/// A remote chat-completion backend.
///
/// Each call is a single stateless exchange: one system instruction and one
/// user utterance in, the assistant's trimmed text out. Prior history is
/// never sent.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, utterance: &str, instruction: &str) -> Result<String, RemoteError>;
}
