//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::{App, SEEK_STEP};

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_play(),
        KeyCode::Char('s') => app.stop(),
        KeyCode::Char('+' | '=') => app.speed_up(),
        KeyCode::Char('-') => app.speed_down(),
        KeyCode::Char('t') => app.cycle_step_size(),
        KeyCode::Char('r') => app.toggle_reverse(),
        KeyCode::Right => app.seek_by(SEEK_STEP),
        KeyCode::Left => app.seek_by(-SEEK_STEP),
        KeyCode::Char(d @ '0'..='9') => {
            let decile = f64::from(d.to_digit(10).unwrap_or(0));
            app.seek_to(decile / 10.0);
        }
        _ => {}
    }
}
