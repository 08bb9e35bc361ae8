mod app;
mod input;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mentor_core::{Conversation, Language, Recognizer, Store};
use ratatui::prelude::*;

use crate::error::MentorError;
use app::ChatApp;

/// Session settings resolved from config and command-line flags.
pub struct Settings {
    pub model: String,
    pub language: Language,
    pub voice_enabled: bool,
}

pub async fn run<S: Store>(
    conversation: Conversation<S>,
    recognizer: Arc<dyn Recognizer>,
    settings: Settings,
) -> Result<(), MentorError> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = ChatApp::new(conversation, recognizer, settings);

    let result = run_loop(&mut terminal, &mut app).await;

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_loop<S: Store>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp<S>,
) -> Result<(), MentorError> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll with a timeout so replies and dictation are picked up
        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            input::handle_event(app, event);
        }

        app.poll_response();
        app.poll_dictation();

        if app.should_quit {
            break;
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}
