//! Terminal output for guide frames.
//!
//! The guide repaints whole lines (a program block shifts, a selection moves
//! along a channel row), so frames are compared line by line. Each dirty line
//! is rewritten as one span, from its first to its last changed cell, with
//! every same-style stretch printed as a single string. A size change or an
//! explicit [`TerminalRenderer::invalidate`] forces a full repaint.

use std::io::{self, Write};
use std::ops::Range;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{
    self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::queue;

use crate::fb::{CellStyle, FrameBuffer, Rgb};

/// What one encoded frame touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Lines rewritten.
    pub lines: usize,
    /// Cells printed across those lines.
    pub cells: usize,
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        }
    }
}

pub struct TerminalRenderer {
    out: io::Stdout,
    shown: Option<FrameBuffer>,
    scratch: Vec<u8>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            shown: None,
            scratch: Vec::with_capacity(32 * 1024),
        }
    }

    /// Switch to raw mode on the alternate screen.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.scratch.clear();
        queue!(self.scratch, EnterAlternateScreen, Hide, DisableLineWrap)?;
        self.flush()
    }

    /// Restore the terminal. Safe to call after a failed `enter`.
    pub fn exit(&mut self) -> Result<()> {
        self.scratch.clear();
        queue!(
            self.scratch,
            ResetColor,
            SetAttribute(Attribute::Reset),
            EnableLineWrap,
            Show,
            LeaveAlternateScreen
        )?;
        self.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Repaint everything on the next draw.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    /// Show `fb`, writing only the lines that differ from the frame on screen.
    ///
    /// The previous frame is handed back through `fb` so the caller can render
    /// the next one into it without allocating.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<FrameStats> {
        self.scratch.clear();
        let stats = match self.shown.as_ref() {
            Some(shown) if shown.width() == fb.width() && shown.height() == fb.height() => {
                encode_changes(shown, fb, &mut self.scratch)?
            }
            _ => encode_frame(fb, &mut self.scratch)?,
        };
        if stats.lines > 0 {
            self.flush()?;
        }

        let mut next = self.shown.take().unwrap_or_else(|| FrameBuffer::new(0, 0));
        next.resize(fb.width(), fb.height());
        std::mem::swap(&mut next, fb);
        self.shown = Some(next);
        Ok(stats)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.write_all(&self.scratch)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Encode a complete repaint of `fb`.
pub fn encode_frame(fb: &FrameBuffer, out: &mut Vec<u8>) -> Result<FrameStats> {
    queue!(out, Clear(ClearType::All))?;
    let mut pen = Pen::default();
    let mut stats = FrameStats::default();
    for y in 0..fb.height() {
        write_span(out, fb, y, 0..fb.width(), &mut pen)?;
        stats.lines += 1;
        stats.cells += fb.width() as usize;
    }
    pen.finish(out)?;
    Ok(stats)
}

/// Encode the lines of `next` that differ from `prev` (same size).
pub fn encode_changes(
    prev: &FrameBuffer,
    next: &FrameBuffer,
    out: &mut Vec<u8>,
) -> Result<FrameStats> {
    let mut pen = Pen::default();
    let mut stats = FrameStats::default();
    for y in 0..next.height() {
        let Some(span) = dirty_span(prev, next, y) else {
            continue;
        };
        stats.lines += 1;
        stats.cells += span.len();
        write_span(out, next, y, span, &mut pen)?;
    }
    pen.finish(out)?;
    Ok(stats)
}

/// Columns `[first changed, last changed]` of line `y`, if any changed.
pub fn dirty_span(prev: &FrameBuffer, next: &FrameBuffer, y: u16) -> Option<Range<u16>> {
    let differs = |x: u16| prev.get(x, y) != next.get(x, y);
    let first = (0..next.width()).find(|x| differs(*x))?;
    let last = (first..next.width())
        .rev()
        .find(|x| differs(*x))
        .unwrap_or(first);
    Some(first..last + 1)
}

fn write_span(
    out: &mut Vec<u8>,
    fb: &FrameBuffer,
    y: u16,
    span: Range<u16>,
    pen: &mut Pen,
) -> Result<()> {
    queue!(out, MoveTo(span.start, y))?;
    let mut text = String::new();
    for x in span {
        let cell = fb.get(x, y).unwrap_or_default();
        if pen.style != Some(cell.style) {
            if !text.is_empty() {
                queue!(out, Print(&text))?;
                text.clear();
            }
            pen.switch(out, cell.style)?;
        }
        text.push(cell.ch);
    }
    if !text.is_empty() {
        queue!(out, Print(&text))?;
    }
    Ok(())
}

/// Tracks the terminal's current style so only changes are emitted.
#[derive(Debug, Default)]
struct Pen {
    style: Option<CellStyle>,
}

impl Pen {
    fn switch(&mut self, out: &mut Vec<u8>, style: CellStyle) -> Result<()> {
        let prev = self.style.replace(style);
        let attrs = prev.map_or(true, |p| p.bold != style.bold || p.dim != style.dim);
        if attrs {
            // SGR reset also drops the colors; both are re-sent below.
            queue!(out, SetAttribute(Attribute::Reset))?;
            if style.bold {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            if style.dim {
                queue!(out, SetAttribute(Attribute::Dim))?;
            }
        }
        if attrs || prev.map(|p| p.fg) != Some(style.fg) {
            queue!(out, SetForegroundColor(style.fg.into()))?;
        }
        if attrs || prev.map(|p| p.bg) != Some(style.bg) {
            queue!(out, SetBackgroundColor(style.bg.into()))?;
        }
        Ok(())
    }

    fn finish(self, out: &mut Vec<u8>) -> Result<()> {
        if self.style.is_some() {
            queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fb::Cell;

    const FG_PREFIX: &str = "\x1b[38;2;";

    fn text(out: &[u8]) -> String {
        String::from_utf8_lossy(out).into_owned()
    }

    #[test]
    fn full_frame_prints_each_line_once() {
        let mut fb = FrameBuffer::new(3, 2);
        let style = CellStyle::default();
        fb.put_str(0, 0, "ABC", 3, style);
        fb.put_str(0, 1, "DEF", 3, style);

        let mut out = Vec::new();
        let stats = encode_frame(&fb, &mut out).unwrap();
        assert_eq!(stats, FrameStats { lines: 2, cells: 6 });
        let s = text(&out);
        assert!(s.contains("ABC"));
        assert!(s.contains("DEF"));
        // one style for the whole frame: colors are set once
        assert_eq!(s.matches(FG_PREFIX).count(), 1);
    }

    #[test]
    fn identical_frames_encode_nothing() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(0, 0, "News", 4, CellStyle::default());

        let mut out = Vec::new();
        let stats = encode_changes(&fb, &fb.clone(), &mut out).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert!(out.is_empty());
    }

    #[test]
    fn dirty_line_is_one_span_from_first_to_last_change() {
        let style = CellStyle::default();
        let prev = FrameBuffer::new(6, 2);
        let mut next = prev.clone();
        next.set(1, 1, Cell { ch: 'X', style });
        next.set(4, 1, Cell { ch: 'Y', style });

        assert_eq!(dirty_span(&prev, &next, 0), None);
        assert_eq!(dirty_span(&prev, &next, 1), Some(1..5));

        let mut out = Vec::new();
        let stats = encode_changes(&prev, &next, &mut out).unwrap();
        assert_eq!(stats, FrameStats { lines: 1, cells: 4 });
        assert!(text(&out).contains("X  Y"));
    }

    #[test]
    fn style_changes_only_where_the_style_differs() {
        let plain = CellStyle::default();
        let bold = plain.bold();
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(0, 0, "ab", 2, plain);
        fb.put_str(2, 0, "cd", 2, bold);

        let mut out = Vec::new();
        encode_frame(&fb, &mut out).unwrap();
        let s = text(&out);
        assert!(s.contains("ab"));
        assert!(s.contains("cd"));
        // attribute change resets, so colors are sent again for the bold run
        assert_eq!(s.matches(FG_PREFIX).count(), 2);
    }
}
