//! Guide cursor: which channel and column are selected, and what is in view.
//!
//! Columns are tracked by their start time rather than by index, so the
//! cursor stays on the same slot when columns are prepended.

use crate::core::GuideSnapshot;
use crate::types::{GuideAction, Millis};

/// Side of the timeline that needs more slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// What the host should do after a cursor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorOutcome {
    /// Nothing changed.
    Unchanged,
    Moved,
    /// The cursor sits on the first/last column; fetch more slots on that
    /// side and apply the action again.
    Fetch(Edge),
    /// Tune to the channel in this row.
    Select(usize),
    Rescan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuideCursor {
    pub row: usize,
    /// Start time of the selected column.
    pub time: Option<Millis>,
    /// First channel row in view.
    pub first_row: usize,
    /// Start time of the first column in view.
    pub first_time: Option<Millis>,
}

impl GuideCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected column index in `snap`.
    pub fn column(&self, snap: &GuideSnapshot) -> Option<usize> {
        let time = self.time?;
        snap.timeline.iter().position(|t| *t == time)
    }

    /// First column index in view.
    pub fn first_column(&self, snap: &GuideSnapshot) -> usize {
        self.first_time
            .and_then(|time| snap.timeline.iter().position(|t| *t == time))
            .unwrap_or(0)
    }

    /// Place the cursor on the column containing `time`, if there is one.
    pub fn focus_time(&mut self, snap: &GuideSnapshot, time: Millis) {
        if let Some(column) = snap.timeline.iter().rposition(|t| *t <= time) {
            self.time = snap.timeline.get(column).copied();
        }
    }

    /// Clamp to `snap` and scroll so the cursor is in view.
    pub fn sync(&mut self, snap: &GuideSnapshot, visible_rows: usize, visible_columns: usize) {
        self.row = self.row.min(snap.channels.len().saturating_sub(1));
        if self.row < self.first_row {
            self.first_row = self.row;
        } else if visible_rows > 0 && self.row >= self.first_row + visible_rows {
            self.first_row = self.row + 1 - visible_rows;
        }

        let Some(column) = self.column(snap).or_else(|| {
            self.time = snap.timeline.front().copied();
            self.time.map(|_| 0)
        }) else {
            self.first_time = None;
            return;
        };

        let mut first = self
            .first_time
            .and_then(|time| snap.timeline.iter().position(|t| *t == time))
            .unwrap_or(column);
        if column < first {
            first = column;
        } else if visible_columns > 0 && column >= first + visible_columns {
            first = column + 1 - visible_columns;
        }
        self.first_time = snap.timeline.get(first).copied();
    }

    pub fn apply(
        &mut self,
        action: GuideAction,
        snap: &GuideSnapshot,
        visible_rows: usize,
        visible_columns: usize,
    ) -> CursorOutcome {
        let outcome = match action {
            GuideAction::ScrollLeft | GuideAction::ScrollRight => {
                let Some(column) = self.column(snap) else {
                    return CursorOutcome::Unchanged;
                };
                let next = if action == GuideAction::ScrollLeft {
                    column.checked_sub(1)
                } else {
                    Some(column + 1).filter(|c| *c < snap.column_count())
                };
                match next {
                    Some(next) => {
                        self.time = snap.timeline.get(next).copied();
                        CursorOutcome::Moved
                    }
                    None if action == GuideAction::ScrollLeft => CursorOutcome::Fetch(Edge::Left),
                    None => CursorOutcome::Fetch(Edge::Right),
                }
            }
            GuideAction::ChannelUp if self.row > 0 => {
                self.row -= 1;
                CursorOutcome::Moved
            }
            GuideAction::ChannelDown if self.row + 1 < snap.channels.len() => {
                self.row += 1;
                CursorOutcome::Moved
            }
            GuideAction::ChannelUp | GuideAction::ChannelDown => CursorOutcome::Unchanged,
            GuideAction::Select if self.row < snap.channels.len() => {
                CursorOutcome::Select(self.row)
            }
            GuideAction::Select => CursorOutcome::Unchanged,
            GuideAction::Rescan => CursorOutcome::Rescan,
        };
        self.sync(snap, visible_rows, visible_columns);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelInfo, GridEvent};

    fn snapshot(channels: usize, times: &[Millis]) -> GuideSnapshot {
        let mut snap = GuideSnapshot::new();
        for index in 0..channels {
            snap.apply(&GridEvent::AppendChannel {
                channel: ChannelInfo {
                    number: index.to_string(),
                    name: format!("Ch{index}"),
                },
                index,
            });
        }
        for (column, time) in times.iter().enumerate() {
            snap.apply(&GridEvent::AddTimeline {
                column,
                time: *time,
            });
        }
        snap
    }

    #[test]
    fn scrolling_past_the_edge_asks_for_a_fetch() {
        let snap = snapshot(1, &[0, 10, 20]);
        let mut cursor = GuideCursor::new();
        cursor.sync(&snap, 5, 5);
        assert_eq!(cursor.time, Some(0));

        assert_eq!(
            cursor.apply(GuideAction::ScrollLeft, &snap, 5, 5),
            CursorOutcome::Fetch(Edge::Left)
        );
        assert_eq!(
            cursor.apply(GuideAction::ScrollRight, &snap, 5, 5),
            CursorOutcome::Moved
        );
        cursor.apply(GuideAction::ScrollRight, &snap, 5, 5);
        assert_eq!(cursor.column(&snap), Some(2));
        assert_eq!(
            cursor.apply(GuideAction::ScrollRight, &snap, 5, 5),
            CursorOutcome::Fetch(Edge::Right)
        );
    }

    #[test]
    fn cursor_follows_its_slot_through_left_growth() {
        let mut snap = snapshot(1, &[20, 30]);
        let mut cursor = GuideCursor::new();
        cursor.focus_time(&snap, 35);
        assert_eq!(cursor.column(&snap), Some(1));

        snap.apply(&GridEvent::AddTimeline { column: 0, time: 10 });
        assert_eq!(cursor.column(&snap), Some(2));
    }

    #[test]
    fn view_scrolls_to_keep_cursor_visible() {
        let snap = snapshot(6, &[0, 1, 2, 3, 4, 5]);
        let mut cursor = GuideCursor::new();
        cursor.sync(&snap, 2, 2);
        for _ in 0..3 {
            cursor.apply(GuideAction::ChannelDown, &snap, 2, 2);
            cursor.apply(GuideAction::ScrollRight, &snap, 2, 2);
        }
        assert_eq!(cursor.row, 3);
        assert_eq!(cursor.first_row, 2);
        assert_eq!(cursor.column(&snap), Some(3));
        assert_eq!(cursor.first_column(&snap), 2);

        for _ in 0..3 {
            cursor.apply(GuideAction::ChannelUp, &snap, 2, 2);
        }
        assert_eq!((cursor.row, cursor.first_row), (0, 0));
        assert_eq!(
            cursor.apply(GuideAction::ChannelUp, &snap, 2, 2),
            CursorOutcome::Unchanged
        );
    }

    #[test]
    fn select_and_rescan() {
        let snap = snapshot(2, &[0]);
        let mut cursor = GuideCursor::new();
        cursor.apply(GuideAction::ChannelDown, &snap, 4, 4);
        assert_eq!(
            cursor.apply(GuideAction::Select, &snap, 4, 4),
            CursorOutcome::Select(1)
        );
        assert_eq!(
            cursor.apply(GuideAction::Rescan, &snap, 4, 4),
            CursorOutcome::Rescan
        );

        let empty = GuideSnapshot::new();
        let mut cursor = GuideCursor::new();
        assert_eq!(
            cursor.apply(GuideAction::Select, &empty, 4, 4),
            CursorOutcome::Unchanged
        );
        assert_eq!(
            cursor.apply(GuideAction::ScrollRight, &empty, 4, 4),
            CursorOutcome::Unchanged
        );
    }
}
