//! Grid core - pure, synchronous timeline and program-grid logic
//!
//! This crate owns the data structures of the program guide and the rules
//! that mutate them. It performs no I/O and never awaits, so:
//!
//! - **Deterministic**: the same calls produce the same grid and event stream
//! - **Atomic**: each mutation runs to completion before returning
//! - **Testable**: every rule is covered by unit tests next to its code
//!
//! # Module Structure
//!
//! - [`program`]: `Program` records, wire validation, ms/slot conversion
//! - [`window`]: the materialized slot range `[offset, offset + len)`
//! - [`grid`]: column x row cells, timeline growth and program placement
//! - [`events`]: `GridEvent` protocol and the `EventBus` observer registry
//! - [`label`]: visible-cell label formatting
//! - [`snapshot`]: renderer-side model rebuilt from events
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tv_epg_core::{GridEvent, Program, ProgramGrid, TimelineUnit};
//!
//! let unit = TimelineUnit::new(1).unwrap();
//! let mut grid = ProgramGrid::new(unit, 0);
//! let mut events = Vec::new();
//!
//! grid.extend_timeline(0, 3, &mut |e| events.push(e)).unwrap();
//! let show = Arc::new(Program::new("Show", 0, 3).unwrap());
//! grid.place_programs(0, &[show], &mut |e| events.push(e));
//!
//! assert_eq!(grid.total_timeslot_count(), 3);
//! assert!(grid.cell(0, 0).unwrap().visible);
//! assert!(!grid.cell(0, 2).unwrap().visible);
//! assert!(matches!(events[0], GridEvent::AddTimeline { column: 0, time: 0 }));
//! ```

pub mod error;
pub mod events;
pub mod grid;
pub mod label;
pub mod program;
pub mod snapshot;
pub mod window;

pub use tv_epg_types as types;

pub use error::GridError;
pub use events::{
    ChannelInfo, ElementId, EventBus, EventKind, GridEvent, ProgramUpdate, StreamHandle,
    SubscriptionId,
};
pub use grid::{earliest_start_wins, Cell, Column, PlacementReport, ProgramGrid};
pub use label::LabelClock;
pub use program::{Program, RawProgram, TimelineUnit};
pub use snapshot::{GuideSnapshot, SnapshotCell};
pub use window::TimelineWindow;
