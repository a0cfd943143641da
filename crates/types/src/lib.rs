//! Shared types module - time vocabulary, defaults and guide actions
//!
//! This crate defines the fundamental types used across the guide.
//! Everything here is plain data with no external dependencies, so it can be
//! used by the grid core, the terminal front-end and the event adapter alike.
//!
//! # Time Units
//!
//! The guide works with two time scales:
//!
//! - **Absolute time** ([`Millis`]): milliseconds since the Unix epoch. Programs
//!   carry their start time and duration in this unit.
//! - **Slots** ([`Slot`]): one grid column per timeline unit. Slot `n` covers the
//!   absolute range `[n * unit, (n + 1) * unit)`.
//!
//! # Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_TIMELINE_UNIT_MS` | 1 800 000 | One column per half hour |
//! | `DEFAULT_FETCH_SLOTS` | 8 | Slots fetched per scroll step |
//! | `MAX_GROWTH_SLOTS` | 4096 | Most columns one timeline request may add |
//! | `DEFAULT_ADAPTER_PORT` | 7878 | Event stream TCP port |
//!
//! # Examples
//!
//! ```
//! use tv_epg_types::{GuideAction, DEFAULT_TIMELINE_UNIT_MS};
//!
//! let action = GuideAction::from_str("scrollRight").unwrap();
//! assert_eq!(action, GuideAction::ScrollRight);
//! assert_eq!(action.as_str(), "scrollRight");
//!
//! assert_eq!(DEFAULT_TIMELINE_UNIT_MS, 30 * 60 * 1000);
//! ```

/// Absolute time in milliseconds since the Unix epoch.
pub type Millis = i64;

/// Absolute slot index (one slot per timeline unit).
pub type Slot = i64;

/// Default width of one grid column: 30 minutes.
pub const DEFAULT_TIMELINE_UNIT_MS: Millis = 30 * 60 * 1000;

/// Default number of slots requested per fetch/scroll step.
pub const DEFAULT_FETCH_SLOTS: i64 = 8;

/// Upper bound on the columns one timeline request may materialize,
/// counting the requested range and any gap filled to reach it.
pub const MAX_GROWTH_SLOTS: i64 = 4096;

/// Default bind host for the event stream adapter.
pub const DEFAULT_ADAPTER_HOST: &str = "127.0.0.1";

/// Default TCP port for the event stream adapter.
pub const DEFAULT_ADAPTER_PORT: u16 = 7878;

/// Protocol version announced by the event stream adapter.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Navigation actions understood by the guide front-ends.
///
/// The terminal key map and the adapter `command` messages both resolve to
/// these actions before they reach the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideAction {
    /// Move the time cursor one slot earlier.
    ScrollLeft,
    /// Move the time cursor one slot later.
    ScrollRight,
    /// Move the channel cursor up one row.
    ChannelUp,
    /// Move the channel cursor down one row.
    ChannelDown,
    /// Tune to the channel under the cursor.
    Select,
    /// Rescan tuners and rebuild the grid.
    Rescan,
}

impl GuideAction {
    /// Parse an action from its camelCase wire name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scrollleft" => Some(GuideAction::ScrollLeft),
            "scrollright" => Some(GuideAction::ScrollRight),
            "channelup" => Some(GuideAction::ChannelUp),
            "channeldown" => Some(GuideAction::ChannelDown),
            "select" => Some(GuideAction::Select),
            "rescan" => Some(GuideAction::Rescan),
            _ => None,
        }
    }

    /// Convert to the camelCase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideAction::ScrollLeft => "scrollLeft",
            GuideAction::ScrollRight => "scrollRight",
            GuideAction::ChannelUp => "channelUp",
            GuideAction::ChannelDown => "channelDown",
            GuideAction::Select => "select",
            GuideAction::Rescan => "rescan",
        }
    }
}
