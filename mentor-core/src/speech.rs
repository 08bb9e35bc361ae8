//! Speech capabilities: text-to-speech output and dictation input.
//!
//! Both are optional. Platforms without them get [`NoopSpeech`], and the
//! conversation behaves identically apart from the missing audio.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::{debug, warn};

use crate::error::SpeechError;
use crate::language::Language;

/// Converts bot text to audio.
///
/// `speak` is fire-and-forget: implementations enqueue the utterance and
/// return immediately.
pub trait SpeechOutput: Send + Sync {
    fn is_available(&self) -> bool;

    fn speak(&self, text: &str, language: Language);

    /// Stops the utterance currently playing and drops any queued ones.
    fn cancel(&self);
}

/// Events reported by a recognizer during one listening session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Transcript(String),
    End,
    Error(String),
}

/// Converts microphone audio to text, one utterance per session.
pub trait Recognizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Begins a session. Results arrive on `events`; the session is over once
    /// `End` or `Error` has been sent or the sender is dropped.
    fn start(&self, events: UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError>;

    fn stop(&self);
}

/// Stand-in for absent speech capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeech;

impl SpeechOutput for NoopSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str, _language: Language) {}

    fn cancel(&self) {}
}

impl Recognizer for NoopSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _events: UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    Idle,
    Listening,
}

/// Appends a dictated segment to the input buffer, separated by a space.
pub fn append_transcript(buffer: &mut String, transcript: &str) {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return;
    }
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(transcript);
}

/// Dictation into a single input control.
///
/// At most one recognition session is active at a time. Transcripts are
/// appended to the caller's buffer so several segments can be dictated
/// before the message is submitted.
pub struct Dictation {
    recognizer: Arc<dyn Recognizer>,
    state: ListeningState,
    events: Option<UnboundedReceiver<RecognitionEvent>>,
}

impl Dictation {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            recognizer,
            state: ListeningState::Idle,
            events: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn state(&self) -> ListeningState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ListeningState::Listening
    }

    pub fn start_listening(&mut self) {
        if self.is_listening() || !self.is_available() {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match self.recognizer.start(tx) {
            Ok(()) => {
                debug!("Dictation started");
                self.events = Some(rx);
                self.state = ListeningState::Listening;
            }
            Err(e) => warn!(error = %e, "Failed to start dictation"),
        }
    }

    pub fn stop_listening(&mut self) {
        if !self.is_listening() {
            return;
        }
        self.recognizer.stop();
        self.finish();
    }

    pub fn toggle(&mut self) {
        if self.is_listening() {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    /// Applies pending recognition events to `buffer`.
    ///
    /// Returns true if the buffer changed.
    pub fn pump(&mut self, buffer: &mut String) -> bool {
        let mut changed = false;

        while let Some(rx) = self.events.as_mut() {
            match rx.try_recv() {
                Ok(RecognitionEvent::Transcript(text)) => {
                    let before = buffer.len();
                    append_transcript(buffer, &text);
                    changed |= buffer.len() != before;
                }
                Ok(RecognitionEvent::End) => self.finish(),
                Ok(RecognitionEvent::Error(e)) => {
                    warn!(error = %e, "Speech recognition failed");
                    self.finish();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.finish(),
            }
        }

        changed
    }

    fn finish(&mut self) {
        self.events = None;
        self.state = ListeningState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Recognizer that replays a fixed script of events on each start.
    #[derive(Default)]
    struct ScriptedRecognizer {
        script: Vec<RecognitionEvent>,
        starts: AtomicUsize,
        stops: AtomicUsize,
        held: Mutex<Option<UnboundedSender<RecognitionEvent>>>,
    }

    impl ScriptedRecognizer {
        fn new(script: Vec<RecognitionEvent>) -> Self {
            Self {
                script,
                ..Default::default()
            }
        }
    }

    impl Recognizer for ScriptedRecognizer {
        fn is_available(&self) -> bool {
            true
        }

        fn start(&self, events: UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            for event in &self.script {
                let _ = events.send(event.clone());
            }
            // Keep the session open so tests control when it ends.
            *self.held.lock().unwrap() = Some(events);
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.held.lock().unwrap().take();
        }
    }

    #[test]
    fn append_to_empty_buffer() {
        let mut buffer = String::new();
        append_transcript(&mut buffer, "hello");
        assert_eq!(buffer, "hello");
    }

    #[test]
    fn append_separates_segments() {
        let mut buffer = "how do I".to_string();
        append_transcript(&mut buffer, " switch careers ");
        assert_eq!(buffer, "how do I switch careers");
    }

    #[test]
    fn append_ignores_blank_transcript() {
        let mut buffer = "keep".to_string();
        append_transcript(&mut buffer, "   ");
        assert_eq!(buffer, "keep");
    }

    #[test]
    fn unavailable_recognizer_stays_idle() {
        let mut dictation = Dictation::new(Arc::new(NoopSpeech));
        dictation.start_listening();
        assert_eq!(dictation.state(), ListeningState::Idle);

        let mut buffer = String::new();
        assert!(!dictation.pump(&mut buffer));
    }

    #[test]
    fn transcript_then_end_returns_to_idle() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![
            RecognitionEvent::Transcript("tips for interviews".to_string()),
            RecognitionEvent::End,
        ]));
        let mut dictation = Dictation::new(recognizer);
        let mut buffer = "give me".to_string();

        dictation.start_listening();
        assert!(dictation.is_listening());

        assert!(dictation.pump(&mut buffer));
        assert_eq!(buffer, "give me tips for interviews");
        assert_eq!(dictation.state(), ListeningState::Idle);
    }

    #[test]
    fn error_returns_to_idle_without_touching_buffer() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![RecognitionEvent::Error(
            "no-speech".to_string(),
        )]));
        let mut dictation = Dictation::new(recognizer);
        let mut buffer = "draft".to_string();

        dictation.start_listening();
        assert!(!dictation.pump(&mut buffer));
        assert_eq!(buffer, "draft");
        assert!(!dictation.is_listening());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![]));
        let mut dictation = Dictation::new(recognizer.clone());

        dictation.start_listening();
        dictation.start_listening();

        assert_eq!(recognizer.starts.load(Ordering::SeqCst), 1);
        assert!(dictation.is_listening());
    }

    #[test]
    fn stop_listening_stops_recognizer() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![]));
        let mut dictation = Dictation::new(recognizer.clone());

        dictation.toggle();
        assert!(dictation.is_listening());
        dictation.toggle();

        assert!(!dictation.is_listening());
        assert_eq!(recognizer.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_sender_ends_session() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![RecognitionEvent::Transcript(
            "one".to_string(),
        )]));
        let mut dictation = Dictation::new(recognizer.clone());
        let mut buffer = String::new();

        dictation.start_listening();
        recognizer.held.lock().unwrap().take();

        dictation.pump(&mut buffer);
        assert_eq!(buffer, "one");
        assert!(!dictation.is_listening());
    }

    #[test]
    fn multiple_sessions_accumulate() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![
            RecognitionEvent::Transcript("segment".to_string()),
            RecognitionEvent::End,
        ]));
        let mut dictation = Dictation::new(recognizer);
        let mut buffer = String::new();

        dictation.start_listening();
        dictation.pump(&mut buffer);
        dictation.start_listening();
        dictation.pump(&mut buffer);

        assert_eq!(buffer, "segment segment");
    }
}
