use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<OpenAiError> for mentor_core::RemoteError {
    fn from(err: OpenAiError) -> Self {
        mentor_core::RemoteError::new(err)
    }
}
