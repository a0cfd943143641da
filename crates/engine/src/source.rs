//! Channel source seam.
//!
//! Tuner scanning, playback and schedule lookup belong to the host platform.
//! The engine reaches them only through these traits.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ChannelInfo, GridError, Program, StreamHandle};
use crate::types::Millis;

/// Absolute time range of a program request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramQuery {
    pub start_time: Millis,
    pub duration: Millis,
}

impl ProgramQuery {
    pub fn end_time(&self) -> Millis {
        self.start_time.saturating_add(self.duration)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("channel {channel} unavailable: {reason}")]
    Unavailable { channel: String, reason: String },

    #[error("tuner scan failed: {0}")]
    Scan(String),

    #[error("playback switch failed: {0}")]
    Playback(String),

    #[error("invalid program data: {0}")]
    InvalidProgram(#[from] GridError),

    #[error("schedule load failed: {0}")]
    Schedule(String),
}

/// One tunable channel.
#[async_trait]
pub trait Channel: Send + Sync {
    fn number(&self) -> &str;

    fn name(&self) -> &str;

    fn info(&self) -> ChannelInfo {
        ChannelInfo {
            number: self.number().to_string(),
            name: self.name().to_string(),
        }
    }

    /// Programs overlapping `query`, ascending by start time.
    async fn get_programs(&self, query: ProgramQuery) -> Result<Vec<Arc<Program>>, SourceError>;
}

/// A channel and its row in the grid.
#[derive(Clone)]
pub struct ChannelItem {
    pub channel: Arc<dyn Channel>,
    pub index: usize,
}

impl fmt::Debug for ChannelItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelItem")
            .field("number", &self.channel.number())
            .field("index", &self.index)
            .finish()
    }
}

/// The host's tuner/channel manager.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn scan_tuners(&self) -> Result<(), SourceError>;

    /// Current lineup, in row order.
    fn channels(&self) -> Vec<ChannelItem>;

    /// Stream of the active tuner, if any.
    fn tuner_stream(&self) -> Option<StreamHandle>;

    /// Start playback of the current source.
    async fn set_playing_source(&self) -> Result<(), SourceError>;

    async fn set_playing_channel(&self, number: &str) -> Result<(), SourceError>;

    /// Navigation location describing what is playing.
    fn current_hash(&self) -> String;
}
