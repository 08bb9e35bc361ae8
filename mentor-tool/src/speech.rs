//! Speech adapters backed by external programs.
//!
//! Synthesis drives an espeak-compatible program; recognition runs a user
//! supplied command that records one utterance and prints its transcript.
//! Both are detected at startup and replaced by `NoopSpeech` when absent.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mentor_core::{
    Language, NoopSpeech, RecognitionEvent, Recognizer, SpeechError, SpeechOutput,
};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Notify, oneshot};
use tracing::{debug, info, warn};

/// espeak's default speaking rate, in words per minute.
const NORMAL_RATE_WPM: u32 = 175;

/// An installed synthesizer voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub language: String,
    pub name: String,
}

/// Parses the table printed by `espeak-ng --voices`.
pub fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let language = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice {
                language: language.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// Picks the voice matching a locale tag, falling back to its primary subtag.
pub fn select_voice<'a>(voices: &'a [Voice], locale: &str) -> Option<&'a Voice> {
    let primary = locale.split('-').next().unwrap_or(locale);
    voices
        .iter()
        .find(|v| v.language.eq_ignore_ascii_case(locale))
        .or_else(|| voices.iter().find(|v| v.language.eq_ignore_ascii_case(primary)))
}

struct Utterance {
    text: String,
    voice: Option<String>,
    generation: u64,
}

/// Queued text-to-speech through an espeak-compatible program.
///
/// Utterances play one at a time in submission order. `cancel` kills the one
/// playing and invalidates everything still queued.
pub struct CommandSynthesizer {
    voices: Vec<Voice>,
    queue: UnboundedSender<Utterance>,
    generation: Arc<AtomicU64>,
    cancelled: Arc<Notify>,
}

impl CommandSynthesizer {
    /// Asks `program` for its voices and starts the playback worker.
    ///
    /// Returns None if the program cannot be run.
    pub async fn detect(program: &str) -> Option<Self> {
        let output = Command::new(program)
            .arg("--voices")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }

        let voices = parse_voices(&String::from_utf8_lossy(&output.stdout));
        debug!(program, voices = voices.len(), "Speech synthesizer detected");
        Some(Self::start(program, voices))
    }

    fn start(program: &str, voices: Vec<Voice>) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let cancelled = Arc::new(Notify::new());

        tokio::spawn(playback(
            program.to_string(),
            rx,
            Arc::clone(&generation),
            Arc::clone(&cancelled),
        ));

        Self {
            voices,
            queue,
            generation,
            cancelled,
        }
    }
}

impl SpeechOutput for CommandSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, text: &str, language: Language) {
        let voice = select_voice(&self.voices, language.locale());
        debug!(
            voice = voice.map(|v| v.name.as_str()).unwrap_or("default"),
            "Queueing utterance"
        );
        let utterance = Utterance {
            text: text.to_string(),
            voice: voice.map(|v| v.language.clone()),
            generation: self.generation.load(Ordering::SeqCst),
        };
        if self.queue.send(utterance).is_err() {
            warn!("Speech worker has stopped");
        }
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancelled.notify_waiters();
    }
}

async fn playback(
    program: String,
    mut rx: UnboundedReceiver<Utterance>,
    generation: Arc<AtomicU64>,
    cancelled: Arc<Notify>,
) {
    while let Some(utterance) = rx.recv().await {
        let notified = cancelled.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if utterance.generation != generation.load(Ordering::SeqCst) {
            continue;
        }

        let mut cmd = Command::new(&program);
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg("-s")
            .arg(NORMAL_RATE_WPM.to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, program = %program, "Failed to start speech synthesizer");
                continue;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(utterance.text.as_bytes()).await {
                warn!(error = %e, "Failed to send text to speech synthesizer");
            }
        }

        tokio::select! {
            status = child.wait() => {
                if let Err(e) = status {
                    warn!(error = %e, "Speech synthesizer failed");
                }
            }
            _ = &mut notified => {
                let _ = child.kill().await;
                debug!("Speech cancelled");
            }
        }
    }
}

/// Single-utterance recognition through an external command.
///
/// The command's stdout, trimmed, is the transcript. A non-zero exit is
/// reported as a recognition error.
pub struct CommandRecognizer {
    argv: Vec<String>,
    session: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandRecognizer {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            session: Mutex::new(None),
        }
    }
}

impl Recognizer for CommandRecognizer {
    fn is_available(&self) -> bool {
        !self.argv.is_empty()
    }

    fn start(&self, events: UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError> {
        let (program, args) = self.argv.split_first().ok_or(SpeechError::Unavailable)?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let (stop_tx, stop_rx) = oneshot::channel();
        *self.session.lock().unwrap() = Some(stop_tx);

        tokio::spawn(async move {
            tokio::select! {
                output = child.wait_with_output() => {
                    let event = match output {
                        Ok(out) if out.status.success() => {
                            let transcript = String::from_utf8_lossy(&out.stdout).trim().to_string();
                            if !transcript.is_empty() {
                                let _ = events.send(RecognitionEvent::Transcript(transcript));
                            }
                            RecognitionEvent::End
                        }
                        Ok(out) => RecognitionEvent::Error(format!("recognizer exited with {}", out.status)),
                        Err(e) => RecognitionEvent::Error(e.to_string()),
                    };
                    let _ = events.send(event);
                }
                _ = stop_rx => {
                    debug!("Recognition stopped");
                }
            }
        });

        Ok(())
    }

    fn stop(&self) {
        if let Some(stop) = self.session.lock().unwrap().take() {
            let _ = stop.send(());
        }
    }
}

/// Speech output for this session: the configured synthesizer if it runs,
/// otherwise silence.
pub async fn speech_output(program: &str) -> Arc<dyn SpeechOutput> {
    match CommandSynthesizer::detect(program).await {
        Some(synth) => Arc::new(synth),
        None => {
            info!(program, "Speech synthesis unavailable");
            Arc::new(NoopSpeech)
        }
    }
}

pub fn recognizer(argv: Option<Vec<String>>) -> Arc<dyn Recognizer> {
    match argv {
        Some(argv) if !argv.is_empty() => Arc::new(CommandRecognizer::new(argv)),
        _ => {
            info!("Speech recognition not configured");
            Arc::new(NoopSpeech)
        }
    }
}
