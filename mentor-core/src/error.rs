use thiserror::Error;

/// Failure writing or decoding the persisted history snapshot.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the remote completion call, whatever the cause.
///
/// Transport errors, non-success statuses and malformed payloads all collapse
/// into this one type; the conversation converts it into an apology message.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RemoteError(Box<dyn std::error::Error + Send + Sync>);

impl RemoteError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Failure of a speech capability.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech capability unavailable")]
    Unavailable,

    #[error("failed to start speech process: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Errors returned by the conversation manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("a reply is already in flight")]
    ReplyInFlight,
}
