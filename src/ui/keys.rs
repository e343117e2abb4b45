//! Key mapping from terminal events to UI commands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::adventure::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    StartAdventure,
    Quit,
    BackToMenu,
    Submit,
    Insert(char),
    Backspace,
    ScrollUp,
    ScrollDown,
}

/// Map a key press to a command for the given view.
pub fn map_key(view: View, key: KeyEvent) -> Option<UiCommand> {
    match view {
        View::Menu => match key.code {
            KeyCode::Enter | KeyCode::Char('1') => Some(UiCommand::StartAdventure),
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(UiCommand::Quit),
            _ => None,
        },
        View::Adventure => match key.code {
            // Shift+Enter never submits.
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => None,
            KeyCode::Enter => Some(UiCommand::Submit),
            KeyCode::Esc => Some(UiCommand::BackToMenu),
            KeyCode::Backspace => Some(UiCommand::Backspace),
            KeyCode::PageUp | KeyCode::Up => Some(UiCommand::ScrollUp),
            KeyCode::PageDown | KeyCode::Down => Some(UiCommand::ScrollDown),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Some(UiCommand::Insert(c))
            }
            _ => None,
        },
    }
}

/// Ctrl+C quits from any view.
pub fn should_quit(key: KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}
