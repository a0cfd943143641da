//! Error types for grid operations.

use thiserror::Error;

use crate::types::{Millis, Slot};

/// Errors raised by the grid core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// The timeline unit must be a positive number of milliseconds.
    #[error("invalid timeline unit: {0}ms (must be > 0)")]
    InvalidTimelineUnit(Millis),

    /// A requested slot range had a negative duration.
    #[error("invalid slot range: start {start}, duration {duration}")]
    InvalidRange { start: Slot, duration: i64 },

    /// A program arrived without a required numeric field.
    #[error("program {title:?} is missing {field}")]
    MissingField { title: String, field: &'static str },

    /// A program field was NaN or infinite.
    #[error("program {title:?} has non-finite {field}")]
    NonFinite { title: String, field: &'static str },

    /// A program declared a negative duration.
    #[error("program {title:?} has negative duration {duration}ms")]
    NegativeDuration { title: String, duration: Millis },

    /// A value does not fit the millisecond/slot arithmetic.
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: String },
}
