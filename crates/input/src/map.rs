//! Key mapping from terminal events to guide actions.

use crate::types::GuideAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to guide actions.
pub fn handle_key_event(key: KeyEvent) -> Option<GuideAction> {
    match key.code {
        // Timeline
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => Some(GuideAction::ScrollLeft),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => {
            Some(GuideAction::ScrollRight)
        }

        // Channels
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => Some(GuideAction::ChannelUp),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => Some(GuideAction::ChannelDown),

        KeyCode::Enter => Some(GuideAction::Select),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(GuideAction::Rescan),

        _ => None,
    }
}

/// Check if key should quit the guide.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
