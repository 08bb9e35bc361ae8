use chrono::Utc;
use mentor_core::{Language, ListeningState, Sender, Store};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::app::{AppMode, ChatApp};

pub fn render<S: Store>(frame: &mut Frame, app: &ChatApp<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Messages
            Constraint::Length(3), // Input
            Constraint::Length(3), // Suggestions
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_messages(frame, app, chunks[1]);
    render_input(frame, app, chunks[2]);
    render_suggestions(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    if app.mode == AppMode::SelectLanguage {
        render_language_popup(frame, app);
    }
}

fn render_header<S: Store>(frame: &mut Frame, app: &ChatApp<S>, area: Rect) {
    let voice = match (app.voice_enabled, app.speech_available()) {
        (true, true) => "Voice On",
        (true, false) => "Voice On (no synthesizer)",
        (false, _) => "Voice Off",
    };

    let line = Line::from(vec![
        Span::styled(
            "AI Mentor",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("●", Style::default().fg(Color::Green)),
        Span::styled(" Online", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("  {}  [{}]  {}", app.language.label(), voice, app.model)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_messages<S: Store>(frame: &mut Frame, app: &ChatApp<S>, area: Rect) {
    let now = Utc::now();
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.messages() {
        let (label, style) = match msg.sender {
            Sender::User => ("You", Style::default().fg(Color::Blue)),
            Sender::Bot => ("Mentor", Style::default().fg(Color::Green)),
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{}:", label), style.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", msg.age(now)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        for line in msg.content.lines() {
            lines.push(Line::from(format!("  {}", line)));
        }

        lines.push(Line::from("")); // Empty line between messages
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "Mentor is typing...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(ref notice) = app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let messages_block = Block::default().borders(Borders::ALL).title("Messages");

    // Stick to the bottom unless the user scrolled up
    let visible_height = area.height.saturating_sub(2) as usize;
    let total_lines = lines.len();
    let scroll = if total_lines > visible_height {
        (total_lines - visible_height).saturating_sub(app.messages_scroll as usize)
    } else {
        0
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(messages_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, area);
}

fn render_input<S: Store>(frame: &mut Frame, app: &ChatApp<S>, area: Rect) {
    let title = match app.dictation.state() {
        ListeningState::Listening => "Input (listening...)",
        ListeningState::Idle => "Input",
    };
    let input_block = Block::default().borders(Borders::ALL).title(title);

    let (display_text, style) = if app.mode == AppMode::Loading {
        (
            "Waiting for the mentor...".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else if app.input.is_empty() {
        (
            "Type a message...".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.input.clone(), Style::default())
    };

    frame.render_widget(Paragraph::new(display_text).style(style).block(input_block), area);

    if app.mode == AppMode::Chat {
        frame.set_cursor_position((area.x + 1 + app.cursor_column(), area.y + 1));
    }
}

fn render_suggestions<S: Store>(frame: &mut Frame, app: &ChatApp<S>, area: Rect) {
    let mut spans = Vec::new();
    for (i, question) in ChatApp::<S>::suggested_questions().iter().enumerate() {
        let style = if app.suggestion_selected == Some(i) {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default().fg(Color::Blue)
        };
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("[{}]", question), style));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Suggested Questions"),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_status_bar<S: Store>(frame: &mut Frame, app: &ChatApp<S>, area: Rect) {
    let status = match app.mode {
        AppMode::Chat if app.confirm_clear => "Press F4 again to confirm clearing the chat",
        AppMode::Chat => {
            "Enter: Send  Tab: Suggestion  F2: Language  F3: Voice  F4: Clear  F5: Dictate  Esc: Quit"
        }
        AppMode::Loading => "Waiting for reply...  F3: Voice  Esc: Quit",
        AppMode::SelectLanguage => "↑/↓: Navigate  Enter: Select  Esc: Cancel",
    };

    let style = if app.confirm_clear {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn render_language_popup<S: Store>(frame: &mut Frame, app: &ChatApp<S>) {
    let area = centered_rect(30, 30, frame.area());

    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = Language::all()
        .iter()
        .map(|&language| {
            let current = language == app.language;
            let style = if current {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let marker = if current { " ✓" } else { "" };
            ListItem::new(format!("{}{}", language.label(), marker)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Language"))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ratatui::widgets::ListState::default();
    state.select(Some(app.popup_selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use mentor_core::{
        CompletionClient, Conversation, HistoryStore, MemoryStore, NoopSpeech, RemoteError,
        WELCOME_MESSAGE,
    };
    use ratatui::{Terminal, backend::TestBackend};

    use crate::chat::Settings;

    struct Unused;

    #[async_trait]
    impl CompletionClient for Unused {
        async fn complete(&self, _utterance: &str, _instruction: &str) -> Result<String, RemoteError> {
            Err(RemoteError::new("unused"))
        }
    }

    fn screen(app: &ChatApp<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn renders_welcome_and_header() {
        let conversation = Conversation::new(
            HistoryStore::new(MemoryStore::new()),
            Arc::new(Unused),
            Arc::new(NoopSpeech),
        );
        let mut app = ChatApp::new(
            conversation,
            Arc::new(NoopSpeech),
            Settings {
                model: "gpt-3.5-turbo".to_string(),
                language: Language::Fr,
                voice_enabled: false,
            },
        );

        let text = screen(&app);
        assert!(text.contains("AI Mentor"));
        assert!(text.contains("Voice Off"));
        assert!(text.contains(Language::Fr.label()));
        assert!(text.contains(&WELCOME_MESSAGE[..20]));
        assert!(text.contains("less than a minute ago"));

        app.open_language_picker();
        assert!(screen(&app).contains("Language"));
    }
}
