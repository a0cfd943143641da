//! TV program guide (workspace facade crate).
//!
//! Re-exports the workspace crates as `tv_epg::{core, engine, adapter, term,
//! input, types}` so the binary, the integration tests and the benches share
//! one import path.

pub use tv_epg_adapter as adapter;
pub use tv_epg_core as core;
pub use tv_epg_engine as engine;
pub use tv_epg_input as input;
pub use tv_epg_term as term;
pub use tv_epg_types as types;
