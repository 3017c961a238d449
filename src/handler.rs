use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode, InputKind};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    app.error_message = None;

    match app.mode {
        AppMode::Normal => handle_normal_mode(app, key),
        AppMode::Input(_) => handle_input_mode(app, key),
        AppMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
            _ => app.cancel(),
        },
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => app.descend(),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => app.ascend(),
        KeyCode::Char(' ') | KeyCode::Tab => app.toggle_expand(),

        KeyCode::Char('m') => app.mark(),
        KeyCode::Char('u') | KeyCode::Esc => app.unmark(),
        KeyCode::Char('r') => app.open_input(InputKind::Rename),
        KeyCode::Char('a') => app.open_input(InputKind::NewFile),
        KeyCode::Char('A') => app.open_input(InputKind::NewDirectory),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('c') => app.copy_here(),
        KeyCode::Char('x') => app.move_here(),

        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('p') => app.toggle_preview(),
        _ => {}
    }
}

fn handle_input_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Esc => app.cancel(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}
