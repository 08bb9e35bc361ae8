use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use mentor_core::Store;

use super::app::{AppMode, ChatApp};

pub fn handle_event<S: Store>(app: &mut ChatApp<S>, event: Event) {
    if let Event::Key(key) = event {
        if key.kind == KeyEventKind::Press {
            handle_key(app, key);
        }
    }
}

fn handle_key<S: Store>(app: &mut ChatApp<S>, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // Any key other than the clear key disarms a pending clear
    if key.code != KeyCode::F(4) {
        app.disarm_clear();
    }

    match app.mode {
        AppMode::Chat => handle_chat_key(app, key),
        AppMode::Loading => handle_loading_key(app, key),
        AppMode::SelectLanguage => handle_popup_key(app, key),
    }
}

fn handle_chat_key<S: Store>(app: &mut ChatApp<S>, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => app.quit(),
        (KeyCode::F(2), _) => app.open_language_picker(),
        (KeyCode::F(3), _) => app.toggle_voice(),
        (KeyCode::F(4), _) => app.press_clear(),
        (KeyCode::F(5), _) => app.toggle_dictation(),
        (KeyCode::Enter, KeyModifiers::NONE) => app.submit(),
        (KeyCode::Tab, _) => app.next_suggestion(),
        (KeyCode::BackTab, _) => app.previous_suggestion(),
        (KeyCode::Up, KeyModifiers::CONTROL) => app.scroll_up(),
        (KeyCode::Down, KeyModifiers::CONTROL) => app.scroll_down(),
        (KeyCode::Backspace, _) => app.input_backspace(),
        (KeyCode::Delete, _) => app.input_delete(),
        (KeyCode::Left, _) => app.input_left(),
        (KeyCode::Right, _) => app.input_right(),
        (KeyCode::Home, _) => app.input_home(),
        (KeyCode::End, _) => app.input_end(),
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => app.input_char(c),
        _ => {}
    }
}

/// Input is disabled while a reply is outstanding.
fn handle_loading_key<S: Store>(app: &mut ChatApp<S>, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => app.quit(),
        (KeyCode::F(3), _) => app.toggle_voice(),
        (KeyCode::Up, KeyModifiers::CONTROL) => app.scroll_up(),
        (KeyCode::Down, KeyModifiers::CONTROL) => app.scroll_down(),
        _ => {}
    }
}

fn handle_popup_key<S: Store>(app: &mut ChatApp<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_popup(),
        KeyCode::Enter => app.popup_select(),
        KeyCode::Up => app.popup_up(),
        KeyCode::Down => app.popup_down(),
        _ => {}
    }
}
