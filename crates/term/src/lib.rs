//! Terminal guide renderer.
//!
//! A small rendering layer for the program guide. It avoids widget toolkits
//! and renders into a plain framebuffer that is flushed to the terminal.
//!
//! - [`guide_view`]: pure snapshot-to-framebuffer mapping, unit-tested
//! - [`cursor`]: selection and scrolling over the snapshot
//! - [`renderer`]: crossterm output, rewriting only the lines that changed
//! - [`throttle`]: redraw only when something changed

pub mod cursor;
pub mod fb;
pub mod guide_view;
pub mod renderer;
pub mod throttle;

pub use tv_epg_core as core;
pub use tv_epg_types as types;

pub use cursor::{CursorOutcome, Edge, GuideCursor};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use guide_view::{GuideView, StatusLine, Viewport};
pub use renderer::{dirty_span, encode_changes, encode_frame, FrameStats, TerminalRenderer};
pub use throttle::RenderThrottle;
