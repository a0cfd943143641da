//! Timeline window - the materialized slot range of the grid
//!
//! The window covers the absolute slots `[offset, offset + len)`. Column `c`
//! of the grid is always slot `offset + c`; every translation between the two
//! goes through [`TimelineWindow::column_of`] and [`TimelineWindow::slot_of`].
//!
//! The window only grows. Pushing at the back extends the right edge; pushing
//! at the front decrements the offset. A full reset is the only way back.

use crate::types::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    offset: Slot,
    len: usize,
}

impl TimelineWindow {
    /// Create an empty window anchored at `offset`.
    pub fn new(offset: Slot) -> Self {
        Self { offset, len: 0 }
    }

    /// Absolute slot of column 0.
    pub fn offset(&self) -> Slot {
        self.offset
    }

    /// Number of materialized columns.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First slot past the right edge.
    pub fn end(&self) -> Slot {
        self.offset + self.len as Slot
    }

    pub fn contains(&self, slot: Slot) -> bool {
        slot >= self.offset && slot < self.end()
    }

    /// Project an absolute slot to a physical column index.
    #[inline]
    pub fn column_of(&self, slot: Slot) -> Option<usize> {
        if self.contains(slot) {
            Some((slot - self.offset) as usize)
        } else {
            None
        }
    }

    /// Absolute slot of a physical column index.
    #[inline]
    pub fn slot_of(&self, column: usize) -> Option<Slot> {
        if column < self.len {
            Some(self.offset + column as Slot)
        } else {
            None
        }
    }

    /// Materialize the slot just past the right edge and return it.
    pub fn push_back(&mut self) -> Slot {
        let slot = self.end();
        self.len += 1;
        slot
    }

    /// Materialize the slot just before the left edge and return it.
    pub fn push_front(&mut self) -> Slot {
        self.offset -= 1;
        self.len += 1;
        self.offset
    }

    /// Drop every column and re-anchor at `offset`.
    pub fn reset(&mut self, offset: Slot) {
        self.offset = offset;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_has_no_columns() {
        let w = TimelineWindow::new(42);
        assert!(w.is_empty());
        assert_eq!(w.end(), 42);
        assert_eq!(w.column_of(42), None);
        assert_eq!(w.slot_of(0), None);
    }

    #[test]
    fn push_back_extends_right_edge() {
        let mut w = TimelineWindow::new(10);
        assert_eq!(w.push_back(), 10);
        assert_eq!(w.push_back(), 11);
        assert_eq!(w.offset(), 10);
        assert_eq!(w.len(), 2);
        assert_eq!(w.column_of(11), Some(1));
    }

    #[test]
    fn push_front_shifts_projection() {
        let mut w = TimelineWindow::new(10);
        w.push_back();
        assert_eq!(w.column_of(10), Some(0));

        assert_eq!(w.push_front(), 9);
        assert_eq!(w.offset(), 9);
        assert_eq!(w.column_of(10), Some(1));
        assert_eq!(w.slot_of(0), Some(9));
    }

    #[test]
    fn reset_reanchors() {
        let mut w = TimelineWindow::new(0);
        w.push_back();
        w.push_front();
        w.reset(7);
        assert_eq!(w, TimelineWindow::new(7));
    }
}
