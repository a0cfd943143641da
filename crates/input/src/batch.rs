//! Per-frame action batching.
//!
//! The front-end drains every pending terminal event before it redraws. Held
//! keys auto-repeat, so one frame can carry a burst of identical presses; the
//! batch keeps scrolling moves (each one moves the cursor) but collapses
//! repeated `Select`/`Rescan` to a single action, and ignores key releases.

use arrayvec::ArrayVec;
use crossterm::event::{KeyEvent, KeyEventKind};

use crate::map::{handle_key_event, should_quit};
use crate::types::GuideAction;

/// Maximum actions kept per frame; extra presses are dropped.
pub const MAX_ACTIONS_PER_FRAME: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct ActionBatch {
    actions: ArrayVec<GuideAction, MAX_ACTIONS_PER_FRAME>,
    quit: bool,
    dropped: usize,
}

impl ActionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key event.
    pub fn push_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release || self.quit {
            return;
        }
        if should_quit(key) {
            self.quit = true;
            return;
        }
        if let Some(action) = handle_key_event(key) {
            self.push(action);
        }
    }

    pub fn push(&mut self, action: GuideAction) {
        let once = matches!(action, GuideAction::Select | GuideAction::Rescan);
        if once && self.actions.contains(&action) {
            return;
        }
        if self.actions.try_push(action).is_err() {
            self.dropped += 1;
        }
    }

    pub fn actions(&self) -> &[GuideAction] {
        &self.actions
    }

    pub fn quit(&self) -> bool {
        self.quit
    }

    /// Presses discarded because the batch was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && !self.quit
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.quit = false;
        self.dropped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn scroll_repeats_are_kept_select_is_collapsed() {
        let mut batch = ActionBatch::new();
        for code in [
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Enter,
            KeyCode::Enter,
            KeyCode::Down,
        ] {
            batch.push_key(press(code));
        }
        assert_eq!(
            batch.actions(),
            &[
                GuideAction::ScrollRight,
                GuideAction::ScrollRight,
                GuideAction::Select,
                GuideAction::ChannelDown
            ]
        );
        assert!(!batch.quit());
    }

    #[test]
    fn releases_are_ignored() {
        let mut batch = ActionBatch::new();
        batch.push_key(KeyEvent {
            code: KeyCode::Left,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert!(batch.is_empty());
    }

    #[test]
    fn quit_stops_the_batch() {
        let mut batch = ActionBatch::new();
        batch.push_key(press(KeyCode::Left));
        batch.push_key(press(KeyCode::Char('q')));
        batch.push_key(press(KeyCode::Right));
        assert!(batch.quit());
        assert_eq!(batch.actions(), &[GuideAction::ScrollLeft]);

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn overflow_is_counted() {
        let mut batch = ActionBatch::new();
        for _ in 0..MAX_ACTIONS_PER_FRAME + 3 {
            batch.push(GuideAction::ScrollRight);
        }
        assert_eq!(batch.actions().len(), MAX_ACTIONS_PER_FRAME);
        assert_eq!(batch.dropped(), 3);
    }
}
