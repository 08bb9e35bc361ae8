//! The conversation state manager.
//!
//! Owns the message list, the loading flag and the last bot reply, and is the
//! only place where history is mutated. Every mutation is persisted right
//! away through the injected [`HistoryStore`].

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::completion::CompletionClient;
use crate::error::{ConversationError, RemoteError};
use crate::history::HistoryStore;
use crate::language::Language;
use crate::message::{Message, Sender};
use crate::speech::SpeechOutput;
use crate::store::Store;

/// Bot greeting that seeds empty or cleared history.
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your AI Mentor. How can I help you with your career journey today?";

/// Bot reply appended in place of any failed completion.
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I couldn't process your request. Please try again later.";

/// An outstanding reply request, detached from the conversation.
///
/// Obtained from [`Conversation::begin_reply`]. Resolving it performs the
/// remote call without borrowing the conversation, so it can be moved to a
/// spawned task while the UI keeps rendering.
pub struct ReplyTicket {
    client: Arc<dyn CompletionClient>,
    utterance: String,
    language: Language,
}

impl ReplyTicket {
    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub async fn resolve(self) -> Result<String, RemoteError> {
        debug!(language = %self.language, "Requesting reply");
        self.client
            .complete(&self.utterance, self.language.instruction())
            .await
    }
}

/// Clears the loading flag when dropped, including when the request future
/// is abandoned mid-flight.
struct LoadingGuard<'a>(&'a mut bool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct Conversation<S: Store> {
    history: HistoryStore<S>,
    completion: Arc<dyn CompletionClient>,
    speech: Arc<dyn SpeechOutput>,
    messages: Vec<Message>,
    is_loading: bool,
    last_bot_message: Option<String>,
}

impl<S: Store> Conversation<S> {
    /// Creates the manager and loads persisted history.
    ///
    /// Empty (or discarded) history is replaced by the welcome message, which
    /// is persisted immediately.
    pub fn new(
        history: HistoryStore<S>,
        completion: Arc<dyn CompletionClient>,
        speech: Arc<dyn SpeechOutput>,
    ) -> Self {
        let mut conversation = Self {
            history,
            completion,
            speech,
            messages: Vec::new(),
            is_loading: false,
            last_bot_message: None,
        };
        conversation.initialize();
        conversation
    }

    fn initialize(&mut self) {
        let loaded = self.history.load_snapshot();
        if loaded.messages.is_empty() {
            self.messages = vec![Message::new(WELCOME_MESSAGE, Sender::Bot)];
            self.persist();
        } else {
            self.messages = loaded.messages;
            // Repaired ids must survive the next load
            if loaded.repaired {
                self.persist();
            }
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_bot_message(&self) -> Option<&str> {
        self.last_bot_message.as_deref()
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn speech(&self) -> &Arc<dyn SpeechOutput> {
        &self.speech
    }

    /// Appends a new message and persists the full history.
    pub fn add_message(&mut self, content: impl Into<String>, sender: Sender) -> &Message {
        let index = self.append(content.into(), sender);
        &self.messages[index]
    }

    /// Resets history to a single welcome message.
    pub fn clear_messages(&mut self) {
        self.messages = vec![Message::new(WELCOME_MESSAGE, Sender::Bot)];
        self.persist();
    }

    /// Asks the remote for a reply to `utterance` and appends it.
    ///
    /// Remote failures never escape: they are logged and turned into the
    /// apology message. The returned message is the bot message appended by
    /// this call. The only error is a rejected overlapping request.
    pub async fn request_reply(
        &mut self,
        utterance: &str,
        language: Language,
        voice_enabled: bool,
    ) -> Result<&Message, ConversationError> {
        let ticket = self.begin_reply(utterance, language)?;

        let outcome = {
            let _guard = LoadingGuard(&mut self.is_loading);
            ticket.resolve().await
        };

        Ok(self.finish_reply(outcome, language, voice_enabled))
    }

    /// Enters the awaiting state and hands out the request to resolve.
    pub fn begin_reply(
        &mut self,
        utterance: &str,
        language: Language,
    ) -> Result<ReplyTicket, ConversationError> {
        if self.is_loading {
            return Err(ConversationError::ReplyInFlight);
        }
        self.is_loading = true;

        Ok(ReplyTicket {
            client: Arc::clone(&self.completion),
            utterance: utterance.to_string(),
            language,
        })
    }

    /// Applies the outcome of a ticket and returns to idle.
    pub fn finish_reply(
        &mut self,
        outcome: Result<String, RemoteError>,
        language: Language,
        voice_enabled: bool,
    ) -> &Message {
        self.is_loading = false;

        let index = match outcome {
            Ok(reply) => {
                let index = self.append(reply.clone(), Sender::Bot);
                if voice_enabled {
                    self.speech.speak(&reply, language);
                }
                self.last_bot_message = Some(reply);
                index
            }
            Err(e) => {
                error!(error = %e, "Error generating bot response");
                self.append(APOLOGY_MESSAGE.to_string(), Sender::Bot)
            }
        };

        &self.messages[index]
    }

    /// Reacts to the voice toggle changing from `previous` to `next`.
    ///
    /// Turning voice on replays the last bot reply; turning it off cancels
    /// whatever is being spoken.
    pub fn apply_voice_transition(&self, previous: bool, next: bool, language: Language) {
        match (previous, next) {
            (false, true) => {
                if let Some(text) = &self.last_bot_message {
                    self.speech.speak(text, language);
                }
            }
            (true, false) => self.speech.cancel(),
            _ => {}
        }
    }

    fn append(&mut self, content: String, sender: Sender) -> usize {
        self.messages.push(Message::new(content, sender));
        self.persist();
        self.messages.len() - 1
    }

    fn persist(&self) {
        if let Err(e) = self.history.save(&self.messages) {
            warn!(error = %e, "Failed to persist chat history");
        }
    }
}
