use async_trait::async_trait;
use mentor_core::{CompletionClient, RemoteError};
use tracing::{debug, instrument};

use crate::convert::{build_request_body, error_message, parse_response};
use crate::error::OpenAiError;
use crate::types::{CompletionRequest, GenerationParams};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Client for OpenAI-compatible chat-completion APIs.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    params: GenerationParams,
}

impl OpenAiClient {
    /// Creates a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Builds the request for one exchange with this client's model and params.
    pub fn request(&self, utterance: &str, instruction: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            instruction: instruction.to_string(),
            utterance: utterance.to_string(),
            params: self.params.clone(),
        }
    }

    /// Executes a completion request and returns the trimmed assistant text.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn send(&self, request: &CompletionRequest) -> Result<String, OpenAiError> {
        let body = build_request_body(request);

        debug!("Sending completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let response_body: serde_json::Value = serde_json::from_str(&text)?;

        debug!("Received successful response");

        parse_response(&response_body)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, utterance: &str, instruction: &str) -> Result<String, RemoteError> {
        let request = self.request(utterance, instruction);
        Ok(self.send(&request).await?)
    }
}
