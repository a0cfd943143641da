//! Terminal input module (controller-facing).
//!
//! Independent of any UI framework. Maps `crossterm` key events into
//! [`crate::types::GuideAction`] and batches them per frame.

pub mod batch;
pub mod map;

pub use tv_epg_types as types;

pub use batch::{ActionBatch, MAX_ACTIONS_PER_FRAME};
pub use map::{handle_key_event, should_quit};
