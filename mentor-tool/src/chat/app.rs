use std::sync::Arc;

use mentor_core::{
    Conversation, Dictation, Language, Message, Recognizer, RemoteError, Sender, Store,
};
use tokio::sync::oneshot;

use super::Settings;

pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "How do I prepare for a data analyst interview?",
    "What skills do I need for software engineering?",
    "How to switch careers into tech?",
    "Tips for remote work productivity",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Chat,
    SelectLanguage,
    Loading,
}

pub struct ChatApp<S: Store> {
    pub mode: AppMode,
    pub should_quit: bool,
    pub conversation: Conversation<S>,
    pub dictation: Dictation,
    pub input: String,
    pub cursor_pos: usize,
    pub model: String,
    pub language: Language,
    pub voice_enabled: bool,
    pub messages_scroll: u16,
    pub response_rx: Option<oneshot::Receiver<Result<String, RemoteError>>>,
    /// Language the outstanding request was sent in.
    pub request_language: Language,
    pub confirm_clear: bool,
    pub suggestion_selected: Option<usize>,
    pub notice: Option<String>,

    // Popup state
    pub popup_selected: usize,
}

impl<S: Store> ChatApp<S> {
    pub fn new(
        conversation: Conversation<S>,
        recognizer: Arc<dyn Recognizer>,
        settings: Settings,
    ) -> Self {
        Self {
            mode: AppMode::Chat,
            should_quit: false,
            conversation,
            dictation: Dictation::new(recognizer),
            input: String::new(),
            cursor_pos: 0,
            model: settings.model,
            language: settings.language,
            voice_enabled: settings.voice_enabled,
            messages_scroll: 0,
            response_rx: None,
            request_language: settings.language,
            confirm_clear: false,
            suggestion_selected: None,
            notice: None,
            popup_selected: 0,
        }
    }

    pub fn suggested_questions() -> &'static [&'static str] {
        SUGGESTED_QUESTIONS
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    pub fn speech_available(&self) -> bool {
        self.conversation.speech().is_available()
    }

    /// Sends whatever is in the input box, or the highlighted suggestion if
    /// the box is empty.
    pub fn submit(&mut self) {
        // Take in anything dictated since the last tick before stopping
        self.poll_dictation();
        self.dictation.stop_listening();

        if self.input.trim().is_empty() {
            if let Some(index) = self.suggestion_selected {
                self.select_suggestion(index);
            }
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor_pos = 0;
        self.send_message(&text);
    }

    pub fn select_suggestion(&mut self, index: usize) {
        if let Some(question) = SUGGESTED_QUESTIONS.get(index) {
            self.suggestion_selected = None;
            self.send_message(question);
        }
    }

    /// Appends the user's message and starts the reply request in the
    /// background.
    pub fn send_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let ticket = match self.conversation.begin_reply(text, self.language) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };

        self.conversation.add_message(text, Sender::User);

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(ticket.resolve().await);
        });

        self.response_rx = Some(rx);
        self.request_language = self.language;
        self.mode = AppMode::Loading;
        self.messages_scroll = 0;
        self.notice = None;
    }

    pub fn poll_response(&mut self) {
        let Some(rx) = self.response_rx.as_mut() else {
            return;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(RemoteError::new("reply task ended without a result"))
            }
        };

        self.response_rx = None;
        self.conversation
            .finish_reply(outcome, self.request_language, self.voice_enabled);
        if self.mode == AppMode::Loading {
            self.mode = AppMode::Chat;
        }
        self.messages_scroll = 0;
    }

    pub fn poll_dictation(&mut self) {
        if self.dictation.pump(&mut self.input) {
            self.cursor_pos = self.input.len();
        }
    }

    pub fn toggle_dictation(&mut self) {
        if !self.dictation.is_available() {
            self.notice = Some("Speech recognition is not available".to_string());
            return;
        }
        self.dictation.toggle();
    }

    pub fn toggle_voice(&mut self) {
        let previous = self.voice_enabled;
        self.voice_enabled = !previous;
        self.conversation
            .apply_voice_transition(previous, self.voice_enabled, self.language);
    }

    /// First press arms the confirmation, second press clears.
    pub fn press_clear(&mut self) {
        if self.confirm_clear {
            self.conversation.clear_messages();
            self.confirm_clear = false;
            self.messages_scroll = 0;
        } else {
            self.confirm_clear = true;
        }
    }

    pub fn disarm_clear(&mut self) {
        self.confirm_clear = false;
    }

    pub fn next_suggestion(&mut self) {
        self.suggestion_selected = Some(match self.suggestion_selected {
            Some(i) => (i + 1) % SUGGESTED_QUESTIONS.len(),
            None => 0,
        });
    }

    pub fn previous_suggestion(&mut self) {
        let last = SUGGESTED_QUESTIONS.len() - 1;
        self.suggestion_selected = Some(match self.suggestion_selected {
            Some(0) | None => last,
            Some(i) => i - 1,
        });
    }

    pub fn open_language_picker(&mut self) {
        self.popup_selected = Language::all()
            .iter()
            .position(|&l| l == self.language)
            .unwrap_or(0);
        self.mode = AppMode::SelectLanguage;
    }

    pub fn close_popup(&mut self) {
        self.mode = if self.is_loading() {
            AppMode::Loading
        } else {
            AppMode::Chat
        };
    }

    pub fn popup_up(&mut self) {
        if self.popup_selected > 0 {
            self.popup_selected -= 1;
        }
    }

    pub fn popup_down(&mut self) {
        if self.popup_selected < Language::all().len() - 1 {
            self.popup_selected += 1;
        }
    }

    pub fn popup_select(&mut self) {
        if let Some(&language) = Language::all().get(self.popup_selected) {
            self.language = language;
        }
        self.close_popup();
    }

    pub fn scroll_up(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_sub(1);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Stops speech and dictation before the terminal is restored.
    pub fn shutdown(&mut self) {
        self.dictation.stop_listening();
        self.conversation.speech().cancel();
    }

    pub fn input_char(&mut self, c: char) {
        self.suggestion_selected = None;
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn input_backspace(&mut self) {
        if self.cursor_pos > 0 {
            let prev_char_boundary = self.input[..self.cursor_pos]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.input.remove(prev_char_boundary);
            self.cursor_pos = prev_char_boundary;
        }
    }

    pub fn input_delete(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn input_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos = self.input[..self.cursor_pos]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn input_right(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.cursor_pos = self.input[self.cursor_pos..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_pos + i)
                .unwrap_or(self.input.len());
        }
    }

    pub fn input_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn input_end(&mut self) {
        self.cursor_pos = self.input.len();
    }

    /// Cursor column in terminal cells.
    pub fn cursor_column(&self) -> u16 {
        self.input[..self.cursor_pos].chars().count() as u16
    }
}
