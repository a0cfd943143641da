//! GuideView: maps a [`GuideSnapshot`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{ElementId, GuideSnapshot, LabelClock};
use crate::cursor::GuideCursor;
use crate::fb::{CellStyle, FrameBuffer, Rgb};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Extra lines shown around the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusLine<'a> {
    /// Navigation location of the playing channel.
    pub location: Option<&'a str>,
    /// Transient message (fetch failures, adapter address).
    pub note: Option<&'a str>,
}

const HEADER_ROWS: u16 = 2;
const FOOTER_ROWS: u16 = 1;
const HELP: &str = "<-/-> time  up/down channel  enter tune  r rescan  q quit";

const TEXT: CellStyle = CellStyle::new(Rgb::new(220, 220, 220), Rgb::new(0, 0, 0));
const TITLE: CellStyle = CellStyle::new(Rgb::new(255, 210, 90), Rgb::new(0, 0, 0)).bold();
const TIME: CellStyle = CellStyle::new(Rgb::new(140, 180, 255), Rgb::new(0, 0, 0));
const EMPTY: CellStyle = CellStyle::new(Rgb::new(90, 90, 100), Rgb::new(0, 0, 0)).dim();
const PROGRAM_A: CellStyle = CellStyle::new(Rgb::new(230, 230, 230), Rgb::new(30, 40, 70));
const PROGRAM_B: CellStyle = CellStyle::new(Rgb::new(230, 230, 230), Rgb::new(45, 30, 65));
const SELECTED: CellStyle = CellStyle::new(Rgb::new(0, 0, 0), Rgb::new(255, 210, 90)).bold();

/// Renders the program guide.
#[derive(Debug, Clone)]
pub struct GuideView {
    clock: LabelClock,
    /// Width of the channel name column.
    name_w: u16,
    /// Width of one timeline column.
    col_w: u16,
}

impl Default for GuideView {
    fn default() -> Self {
        Self::new(LabelClock::utc())
    }
}

impl GuideView {
    pub fn new(clock: LabelClock) -> Self {
        Self {
            clock,
            name_w: 16,
            col_w: 14,
        }
    }

    pub fn with_widths(mut self, name_w: u16, col_w: u16) -> Self {
        self.name_w = name_w;
        self.col_w = col_w.max(2);
        self
    }

    /// Channel rows and timeline columns that fit in `viewport`.
    pub fn layout(&self, viewport: Viewport) -> (usize, usize) {
        let rows = viewport.height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);
        let columns = viewport.width.saturating_sub(self.name_w) / self.col_w;
        (rows as usize, columns as usize)
    }

    /// Render into an existing framebuffer, resizing it to `viewport`.
    pub fn render_into(
        &self,
        snap: &GuideSnapshot,
        cursor: &GuideCursor,
        status: StatusLine<'_>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(TEXT.into_cell(' '));
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }

        let (rows, columns) = self.layout(viewport);
        let first_column = cursor.first_column(snap);
        let last_column = (first_column + columns).min(snap.column_count());

        // Title line.
        let w = fb.put_str(1, 0, "TV GUIDE", viewport.width, TITLE);
        if let Some(location) = status.location {
            fb.put_str(w + 3, 0, location, viewport.width, TEXT);
        }

        // Timeline header.
        fb.put_str(1, 1, "Channel", self.name_w.saturating_sub(1), TIME);
        for (i, column) in (first_column..last_column).enumerate() {
            let Some(time) = snap.timeline.get(column) else {
                continue;
            };
            let x = self.name_w + (i as u16) * self.col_w;
            fb.put_str(x + 1, 1, &self.clock.clock_time(*time), self.col_w - 1, TIME);
        }

        if !snap.channels_ready && snap.channels.is_empty() {
            fb.put_str(1, HEADER_ROWS, "Scanning channels...", viewport.width, EMPTY);
        }

        let selected_column = cursor.column(snap);
        for (i, row) in (cursor.first_row..snap.channels.len()).take(rows).enumerate() {
            let y = HEADER_ROWS + i as u16;
            let channel = &snap.channels[row];
            let on_row = row == cursor.row;
            let name = format!("{} {}", channel.number, channel.name);
            fb.put_str(
                1,
                y,
                &name,
                self.name_w.saturating_sub(2),
                if on_row { TITLE } else { TEXT },
            );

            let mut column = first_column;
            while column < last_column {
                let x = self.name_w + ((column - first_column) as u16) * self.col_w;
                let Some(cell) = snap.cell(row, column) else {
                    let style = if on_row && selected_column == Some(column) {
                        SELECTED
                    } else {
                        EMPTY
                    };
                    fb.fill_rect(x, y, self.col_w, 1, ' ', style);
                    fb.put_char(x + 1, y, '.', style);
                    column += 1;
                    continue;
                };

                let run = (column..last_column)
                    .take_while(|c| {
                        snap.cell(row, *c).map(|other| other.element) == Some(cell.element)
                    })
                    .count();
                let selected =
                    on_row && selected_column.is_some_and(|s| s >= column && s < column + run);
                let style = if selected {
                    SELECTED
                } else {
                    block_style(cell.element)
                };
                let width = (run as u16) * self.col_w;
                fb.fill_rect(x, y, width, 1, ' ', style);
                fb.put_char(x, y, '|', style);
                let label = snap.label(cell.element).unwrap_or("...");
                fb.put_str(x + 1, y, label, width.saturating_sub(2), style);
                column += run;
            }
        }

        let footer = viewport.height - 1;
        fb.put_str(1, footer, status.note.unwrap_or(HELP), viewport.width, EMPTY);
    }
}

fn block_style(element: ElementId) -> CellStyle {
    if (element.slot + element.row as i64).rem_euclid(2) == 0 {
        PROGRAM_A
    } else {
        PROGRAM_B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelInfo, GridEvent, ProgramUpdate};

    fn snapshot() -> GuideSnapshot {
        let mut snap = GuideSnapshot::new();
        let mut apply = |e: GridEvent| snap.apply(&e);
        apply(GridEvent::Reset { generation: 1 });
        for (index, name) in ["News", "Kids"].iter().enumerate() {
            apply(GridEvent::AppendChannel {
                channel: ChannelInfo {
                    number: (index + 1).to_string(),
                    name: name.to_string(),
                },
                index,
            });
        }
        apply(GridEvent::AllChannelFetched);
        for column in 0..3 {
            apply(GridEvent::AddTimeline {
                column,
                time: column as i64 * 30 * 60 * 1000,
            });
        }
        let element = ElementId { row: 0, slot: 0 };
        for column in 0..2 {
            apply(GridEvent::UpdateProgram(ProgramUpdate {
                row: 0,
                column,
                slot: column as i64,
                duration: 2 - column,
                is_visible: column == 0,
                element,
                title: (column == 0).then(|| "0:0, 2, Headlines".to_string()),
                item: None,
            }));
        }
        snap
    }

    #[test]
    fn renders_header_channels_and_labels() {
        let snap = snapshot();
        let view = GuideView::default().with_widths(10, 12);
        let mut cursor = GuideCursor::new();
        let viewport = Viewport::new(70, 6);
        cursor.sync(&snap, 3, 5);

        let mut fb = FrameBuffer::new(1, 1);
        view.render_into(&snap, &cursor, StatusLine::default(), viewport, &mut fb);

        assert_eq!((fb.width(), fb.height()), (70, 6));
        assert!(fb.row_text(0).contains("TV GUIDE"));
        let header = fb.row_text(1);
        assert!(header.contains("00:00"));
        assert!(header.contains("00:30"));
        assert!(header.contains("01:00"));

        let news = fb.row_text(2);
        assert!(news.starts_with(" 1 News"));
        // one label spanning two columns
        assert_eq!(news.matches("Headlines").count(), 1);
        assert!(fb.row_text(3).starts_with(" 2 Kids"));
        assert!(fb.row_text(5).contains("q quit"));
    }

    #[test]
    fn cursor_highlights_the_whole_program_block() {
        let snap = snapshot();
        let view = GuideView::default().with_widths(10, 12);
        let mut cursor = GuideCursor::new();
        cursor.sync(&snap, 3, 3);
        cursor.time = snap.timeline.get(1).copied();

        let mut fb = FrameBuffer::new(46, 6);
        view.render_into(&snap, &cursor, StatusLine::default(), Viewport::new(46, 6), &mut fb);

        // both columns of the block carry the selection style
        assert_eq!(fb.get(10, 2).map(|c| c.style), Some(SELECTED));
        assert_eq!(fb.get(30, 2).map(|c| c.style), Some(SELECTED));
        // the empty third column does not
        assert_eq!(fb.get(35, 2).map(|c| c.style), Some(EMPTY));
    }

    #[test]
    fn status_and_empty_guide() {
        let view = GuideView::default();
        let snap = GuideSnapshot::new();
        let mut fb = FrameBuffer::new(1, 1);
        let status = StatusLine {
            location: Some("#/tuner0/1"),
            note: Some("fetch failed for 1 channel"),
        };
        view.render_into(&snap, &GuideCursor::new(), status, Viewport::new(60, 5), &mut fb);

        assert!(fb.row_text(0).contains("#/tuner0/1"));
        assert!(fb.row_text(2).contains("Scanning channels..."));
        assert!(fb.row_text(4).contains("fetch failed"));
    }

    #[test]
    fn layout_counts_rows_and_columns() {
        let view = GuideView::default().with_widths(10, 12);
        assert_eq!(view.layout(Viewport::new(46, 6)), (3, 3));
        assert_eq!(view.layout(Viewport::new(5, 2)), (0, 0));
    }
}
