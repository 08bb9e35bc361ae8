//! Core of the AI Mentor chat client.
//!
//! This crate holds everything that does not depend on a concrete platform:
//! the message model, the key-value [`Store`] abstraction, persistence of the
//! history snapshot, the [`CompletionClient`] and speech seams, and the
//! [`Conversation`] state manager that ties them together.
//!
//! Collaborators are injected rather than reached through globals, so the
//! whole conversation can run against [`MemoryStore`], [`NoopSpeech`] and a
//! test double for the remote.

mod completion;
mod conversation;
mod error;
mod history;
mod language;
mod message;
mod speech;
mod store;

pub use completion::CompletionClient;
pub use conversation::{APOLOGY_MESSAGE, Conversation, ReplyTicket, WELCOME_MESSAGE};
pub use error::{ConversationError, HistoryError, RemoteError, SpeechError};
pub use history::{HISTORY_KEY, HistoryStore, LoadedHistory};
pub use language::Language;
pub use message::{Message, Sender, time_ago};
pub use speech::{
    Dictation, ListeningState, NoopSpeech, RecognitionEvent, Recognizer, SpeechOutput,
    append_transcript,
};
pub use store::{MemoryStore, Store};
