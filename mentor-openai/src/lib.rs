//! OpenAI-compatible chat-completion client for the mentor chat.
//!
//! Each call is a single stateless exchange: the language-specific system
//! instruction and the user's utterance go out, the first choice's trimmed
//! text comes back.
//!
//! # Example
//!
//! ```ignore
//! use mentor_core::{CompletionClient, Language};
//! use mentor_openai::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = OpenAiClient::new("your-api-key").model("gpt-3.5-turbo");
//!     let reply = client
//!         .complete("How do I prepare for a data analyst interview?", Language::En.instruction())
//!         .await
//!         .unwrap();
//!     println!("{}", reply);
//! }
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient};
pub use convert::{build_request_body, parse_response};
pub use error::OpenAiError;
pub use types::{CompletionRequest, GenerationParams};
