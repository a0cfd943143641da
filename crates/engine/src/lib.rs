//! Guide engine - the EPG controller and its channel sources
//!
//! This crate connects the synchronous grid core to asynchronous channel
//! sources:
//!
//! - [`source`]: `Channel` / `ChannelSource` traits implemented by the host
//! - [`memory`]: in-memory and JSON-backed source used by tests and the demo
//! - [`fetch`]: concurrent per-channel requests with an explicit settle tally
//! - [`controller`]: `EpgController` - timeline growth, fetch, rescan, tuning
//! - [`config`]: environment-driven configuration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tv_epg_core::Program;
//! use tv_epg_engine::{EpgConfig, EpgController, StaticChannel, StaticSource};
//!
//! # tokio_test::block_on(async {
//! let source = Arc::new(StaticSource::new(vec![StaticChannel::new("1", "News")
//!     .with_programs(vec![Program::new("Headlines", 0, 3).unwrap()])]));
//! let config = EpgConfig { timeline_unit_ms: 1, timeline_offset: 0, ..EpgConfig::default() };
//!
//! let controller = EpgController::new(source, &config).unwrap();
//! controller.start().await.unwrap();
//! let report = controller.fetch_programs(0, 3).await.unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(controller.total_timeslot_count(), 3);
//! # });
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod source;

pub use tv_epg_core as core;
pub use tv_epg_types as types;

pub use config::{now_ms, EpgConfig};
pub use controller::EpgController;
pub use error::EngineError;
pub use fetch::{fetch_channels, ChannelOutcome, FetchReport, FetchTally};
pub use memory::{ScheduleChannel, ScheduleFile, StaticChannel, StaticSource};
pub use source::{Channel, ChannelItem, ChannelSource, ProgramQuery, SourceError};
