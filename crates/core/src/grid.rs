//! Program grid - sparse (column x row) table of program cells
//!
//! Columns are keyed by absolute slot; the [`TimelineWindow`] is the only
//! place that projects slots to physical column indices. A column exists for
//! every slot in the window, occupied or not, so the column count always
//! equals the window length.
//!
//! Mutation is synchronous: [`ProgramGrid::extend_timeline`] and
//! [`ProgramGrid::place_programs`] run to completion and report every change
//! through the `emit` callback before returning.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::GridError;
use crate::events::{ElementId, GridEvent, ProgramUpdate};
use crate::label::LabelClock;
use crate::program::{Program, TimelineUnit};
use crate::types::{Millis, Slot, MAX_GROWTH_SLOTS};
use crate::window::TimelineWindow;

/// One occupied (column, row) position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub program: Arc<Program>,
    /// Render handle of the visible cell of this placement.
    pub element: ElementId,
    /// True only for the leftmost cell of a placement.
    pub visible: bool,
}

/// Occupied cells of one column, by row.
pub type Column = BTreeMap<usize, Cell>;

/// Outcome of placing one channel's batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Programs that covered at least one materialized column.
    pub placed: usize,
    /// Programs entirely outside the window (or zero length).
    pub skipped: usize,
    pub cells_written: usize,
}

/// Scan order implementing the overlap rule **earliest start wins**.
///
/// Programs are visited from the latest start to the earliest and every write
/// replaces the previous occupant of a column, so a column claimed by several
/// programs of one batch ends up holding the earliest-starting one. Batches are
/// expected in ascending start order; an unsorted batch is stably sorted first.
///
/// A later program that is overwritten at its start but outlasts the earlier
/// one keeps its tail columns without a visible cell. Those tail cells still
/// carry the later program's element, which now names a column owned by the
/// earlier program, so a renderer has no label to draw for them.
pub fn earliest_start_wins(programs: &[Arc<Program>]) -> Vec<&Arc<Program>> {
    let mut order: Vec<&Arc<Program>> = programs.iter().collect();
    let sorted = programs
        .windows(2)
        .all(|pair| pair[0].start_time <= pair[1].start_time);
    if !sorted {
        warn!(
            programs = programs.len(),
            "program batch not sorted by start time; sorting before placement"
        );
        order.sort_by_key(|p| p.start_time);
    }
    order.reverse();
    order
}

#[derive(Debug, Clone)]
pub struct ProgramGrid {
    unit: TimelineUnit,
    window: TimelineWindow,
    columns: BTreeMap<Slot, Column>,
    clock: LabelClock,
}

impl ProgramGrid {
    /// Create an empty grid anchored at `offset`.
    pub fn new(unit: TimelineUnit, offset: Slot) -> Self {
        Self {
            unit,
            window: TimelineWindow::new(offset),
            columns: BTreeMap::new(),
            clock: LabelClock::utc(),
        }
    }

    pub fn with_clock(mut self, clock: LabelClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn unit(&self) -> TimelineUnit {
        self.unit
    }

    pub fn window(&self) -> &TimelineWindow {
        &self.window
    }

    pub fn clock(&self) -> &LabelClock {
        &self.clock
    }

    /// Absolute slot of column 0.
    pub fn timeline_offset(&self) -> Slot {
        self.window.offset()
    }

    pub fn total_timeslot_count(&self) -> usize {
        self.columns.len()
    }

    /// Materialize every slot of `[start, start + duration)`.
    ///
    /// Right growth runs first and emits `addTimeline(len - 1, time)` per
    /// appended column in increasing time order. Left growth follows and emits
    /// `addTimeline(0, time)` per prepended column in decreasing time order.
    /// Slots between the window and a disjoint request are materialized too, so
    /// columns stay contiguous. An empty window is re-anchored at `start`.
    ///
    /// A request that would add more than [`MAX_GROWTH_SLOTS`] columns
    /// (range plus gap) fails with [`GridError::OutOfRange`] and changes
    /// nothing.
    ///
    /// Returns the number of new columns.
    pub fn extend_timeline<F>(
        &mut self,
        start: Slot,
        duration: i64,
        emit: &mut F,
    ) -> Result<usize, GridError>
    where
        F: FnMut(GridEvent),
    {
        if duration < 0 {
            return Err(GridError::InvalidRange { start, duration });
        }
        if duration == 0 {
            return Ok(0);
        }
        let end = start.checked_add(duration).ok_or(GridError::OutOfRange {
            what: "slot range end",
            value: format!("{start}+{duration}"),
        })?;

        let growth = if self.window.is_empty() {
            duration
        } else {
            let right = end.saturating_sub(self.window.end()).max(0);
            let left = self.window.offset().saturating_sub(start).max(0);
            right.saturating_add(left)
        };
        if growth > MAX_GROWTH_SLOTS {
            return Err(GridError::OutOfRange {
                what: "timeline growth",
                value: format!("{growth} slots for {start}+{duration}"),
            });
        }

        if self.window.is_empty() {
            self.window.reset(start);
        }

        let mut added = 0usize;
        while self.window.end() < end {
            let slot = self.window.push_back();
            self.columns.insert(slot, Column::new());
            emit(GridEvent::AddTimeline {
                column: self.window.len() - 1,
                time: self.unit.time_of(slot),
            });
            added += 1;
        }
        while self.window.offset() > start {
            let slot = self.window.push_front();
            self.columns.insert(slot, Column::new());
            emit(GridEvent::AddTimeline {
                column: 0,
                time: self.unit.time_of(slot),
            });
            added += 1;
        }
        Ok(added)
    }

    /// Place one channel's programs into `row`.
    ///
    /// Each program covers `[floor(start / unit), floor(start / unit) +
    /// ceil(duration / unit))`, clamped to the window. The leftmost covered
    /// column becomes the visible cell and is announced with its label; each
    /// following column copies the element of the cell before it and is
    /// announced as hidden. Overlaps resolve by [`earliest_start_wins`].
    pub fn place_programs<F>(
        &mut self,
        row: usize,
        programs: &[Arc<Program>],
        emit: &mut F,
    ) -> PlacementReport
    where
        F: FnMut(GridEvent),
    {
        let mut report = PlacementReport::default();
        let left = self.window.offset();
        let right = self.window.end();

        for program in earliest_start_wins(programs) {
            let span = self.unit.span_of(program);
            let first = span.start.max(left);
            let end = span.end.min(right);
            if first >= end {
                report.skipped += 1;
                continue;
            }

            let leftmost = ElementId { row, slot: first };
            for slot in first..end {
                let Some(column) = self.window.column_of(slot) else {
                    continue;
                };
                let visible = slot == first;
                let element = if visible {
                    leftmost
                } else {
                    self.cell_at(row, slot - 1)
                        .map_or(leftmost, |prev| prev.element)
                };

                self.columns.entry(slot).or_default().insert(
                    row,
                    Cell {
                        program: Arc::clone(program),
                        element,
                        visible,
                    },
                );

                let (title, item) = if visible {
                    (
                        Some(self.clock.label(program, self.unit)),
                        Some(Arc::clone(program)),
                    )
                } else {
                    (None, None)
                };
                emit(GridEvent::UpdateProgram(ProgramUpdate {
                    row,
                    column,
                    slot,
                    duration: (end - slot) as usize,
                    is_visible: visible,
                    element,
                    title,
                    item,
                }));
                report.cells_written += 1;
            }
            report.placed += 1;
        }
        report
    }

    /// Re-announce the current timeline and cells, as if built from scratch.
    ///
    /// Emits `addTimeline` for every column left to right, `allTimelineAdded`
    /// when there is at least one column, then one `updateProgram` per
    /// occupied cell. Lets a late subscriber catch up without touching the
    /// grid.
    pub fn replay<F>(&self, emit: &mut F)
    where
        F: FnMut(GridEvent),
    {
        for (column, time) in self.column_times().enumerate() {
            emit(GridEvent::AddTimeline { column, time });
        }
        if !self.columns.is_empty() {
            emit(GridEvent::AllTimelineAdded);
        }

        let rows: std::collections::BTreeSet<usize> = self
            .columns
            .values()
            .flat_map(|column| column.keys().copied())
            .collect();
        for row in rows {
            let cells: Vec<(usize, &Cell)> = self.row_cells(row).collect();
            for (i, (column, cell)) in cells.iter().enumerate() {
                let run = cells[i..]
                    .iter()
                    .zip(*column..)
                    .take_while(|((c, next), expected)| {
                        *c == *expected && next.element == cell.element
                    })
                    .count();
                let (title, item) = if cell.visible {
                    (
                        Some(self.clock.label(&cell.program, self.unit)),
                        Some(Arc::clone(&cell.program)),
                    )
                } else {
                    (None, None)
                };
                emit(GridEvent::UpdateProgram(ProgramUpdate {
                    row,
                    column: *column,
                    slot: self.window.offset() + *column as Slot,
                    duration: run,
                    is_visible: cell.visible,
                    element: cell.element,
                    title,
                    item,
                }));
            }
        }
    }

    /// Cell at a physical column index.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        let slot = self.window.slot_of(column)?;
        self.cell_at(row, slot)
    }

    /// Cell at an absolute slot.
    pub fn cell_at(&self, row: usize, slot: Slot) -> Option<&Cell> {
        self.columns.get(&slot)?.get(&row)
    }

    /// Occupied cells of `row` as `(column, cell)`, left to right.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        let offset = self.window.offset();
        self.columns.iter().filter_map(move |(slot, column)| {
            column
                .get(&row)
                .map(|cell| ((*slot - offset) as usize, cell))
        })
    }

    /// Absolute start time of every column, left to right.
    pub fn column_times(&self) -> impl Iterator<Item = Millis> + '_ {
        self.columns.keys().map(|slot| self.unit.time_of(*slot))
    }

    /// Drop every column and cell and re-anchor the window at `offset`.
    pub fn reset(&mut self, offset: Slot) {
        self.columns.clear();
        self.window.reset(offset);
    }
}
