//! Engine error type.

use thiserror::Error;

use crate::core::GridError;
use crate::source::SourceError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("channel index {index} out of range ({count} channels)")]
    ChannelOutOfRange { index: usize, count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
