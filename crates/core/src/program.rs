//! Program records and the millisecond/slot conversion.
//!
//! Programs arrive from channel sources as loosely typed records
//! ([`RawProgram`]). They are validated exactly once, at the boundary, so the
//! grid only ever sees finite start times and non-negative durations.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::types::{Millis, Slot};

/// Largest integral millisecond value that survives an `f64` round trip.
const MAX_EXACT_MS: f64 = 9_007_199_254_740_991.0;

/// A scheduled broadcast item.
///
/// Immutable once fetched. Sources hand programs out as `Arc<Program>` and the
/// grid keeps clones of that `Arc`, never copies of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProgram")]
pub struct Program {
    pub title: String,
    pub start_time: Millis,
    pub duration: Millis,
}

impl Program {
    /// Create a program, rejecting negative durations.
    pub fn new(
        title: impl Into<String>,
        start_time: Millis,
        duration: Millis,
    ) -> Result<Self, GridError> {
        let title = title.into();
        if duration < 0 {
            return Err(GridError::NegativeDuration { title, duration });
        }
        Ok(Self {
            title,
            start_time,
            duration,
        })
    }

    /// Absolute end time (exclusive).
    pub fn end_time(&self) -> Millis {
        self.start_time.saturating_add(self.duration)
    }
}

/// Wire form of a program as delivered by a source.
///
/// Numeric fields are optional floats so that missing and NaN values can be
/// detected and reported instead of leaking into slot arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProgram {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TryFrom<RawProgram> for Program {
    type Error = GridError;

    fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
        let start_time = checked_millis(&raw.title, "startTime", raw.start_time)?;
        let duration = checked_millis(&raw.title, "duration", raw.duration)?;
        Program::new(raw.title, start_time, duration)
    }
}

fn checked_millis(title: &str, field: &'static str, value: Option<f64>) -> Result<Millis, GridError> {
    let value = value.ok_or_else(|| GridError::MissingField {
        title: title.to_string(),
        field,
    })?;
    if !value.is_finite() {
        return Err(GridError::NonFinite {
            title: title.to_string(),
            field,
        });
    }
    let rounded = value.round();
    if rounded.abs() > MAX_EXACT_MS {
        return Err(GridError::OutOfRange {
            what: field,
            value: value.to_string(),
        });
    }
    Ok(rounded as Millis)
}

/// Duration represented by one grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineUnit(Millis);

impl TimelineUnit {
    pub fn new(unit_ms: Millis) -> Result<Self, GridError> {
        if unit_ms <= 0 {
            return Err(GridError::InvalidTimelineUnit(unit_ms));
        }
        Ok(Self(unit_ms))
    }

    pub fn as_millis(self) -> Millis {
        self.0
    }

    /// Slot containing `time` (floor division, also for negative times).
    pub fn slot_of(self, time: Millis) -> Slot {
        time.div_euclid(self.0)
    }

    /// Number of slots needed to cover `duration` (ceiling division).
    pub fn slots_for(self, duration: Millis) -> i64 {
        let whole = duration / self.0;
        if duration % self.0 > 0 {
            whole + 1
        } else {
            whole
        }
    }

    /// Absolute start time of `slot`.
    pub fn time_of(self, slot: Slot) -> Millis {
        slot.saturating_mul(self.0)
    }

    /// Convert a slot count into milliseconds.
    pub fn duration_of(self, slots: i64) -> Millis {
        slots.saturating_mul(self.0)
    }

    /// Unclamped slot interval `[startSlot, endSlot)` occupied by `program`.
    pub fn span_of(self, program: &Program) -> Range<Slot> {
        let start = self.slot_of(program.start_time);
        let end = start.saturating_add(self.slots_for(program.duration));
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_rejects_non_positive() {
        assert_eq!(
            TimelineUnit::new(0),
            Err(GridError::InvalidTimelineUnit(0))
        );
        assert!(TimelineUnit::new(-5).is_err());
        assert!(TimelineUnit::new(1).is_ok());
    }

    #[test]
    fn slot_of_floors_negative_times() {
        let unit = TimelineUnit::new(10).unwrap();
        assert_eq!(unit.slot_of(0), 0);
        assert_eq!(unit.slot_of(9), 0);
        assert_eq!(unit.slot_of(10), 1);
        assert_eq!(unit.slot_of(-1), -1);
        assert_eq!(unit.slot_of(-10), -1);
        assert_eq!(unit.slot_of(-11), -2);
    }

    #[test]
    fn span_rounds_duration_up() {
        let unit = TimelineUnit::new(10).unwrap();
        let p = Program::new("news", 15, 11).unwrap();
        // starts in slot 1, needs two slots for 11ms
        assert_eq!(unit.span_of(&p), 1..3);

        let exact = Program::new("exact", 20, 20).unwrap();
        assert_eq!(unit.span_of(&exact), 2..4);

        let empty = Program::new("empty", 20, 0).unwrap();
        assert_eq!(unit.span_of(&empty), 2..2);
    }

    #[test]
    fn raw_program_missing_fields_are_distinct_errors() {
        let raw = RawProgram {
            title: "late show".into(),
            start_time: None,
            duration: Some(5.0),
        };
        assert_eq!(
            Program::try_from(raw),
            Err(GridError::MissingField {
                title: "late show".into(),
                field: "startTime"
            })
        );

        let raw = RawProgram {
            title: "late show".into(),
            start_time: Some(0.0),
            duration: None,
        };
        assert!(matches!(
            Program::try_from(raw),
            Err(GridError::MissingField { field: "duration", .. })
        ));
    }

    #[test]
    fn raw_program_nan_is_rejected() {
        let raw = RawProgram {
            title: "static".into(),
            start_time: Some(f64::NAN),
            duration: Some(5.0),
        };
        assert!(matches!(
            Program::try_from(raw),
            Err(GridError::NonFinite { field: "startTime", .. })
        ));

        let raw = RawProgram {
            title: "static".into(),
            start_time: Some(0.0),
            duration: Some(f64::INFINITY),
        };
        assert!(matches!(
            Program::try_from(raw),
            Err(GridError::NonFinite { field: "duration", .. })
        ));
    }

    #[test]
    fn raw_program_negative_duration_is_rejected() {
        let raw = RawProgram {
            title: "rewind".into(),
            start_time: Some(100.0),
            duration: Some(-1.0),
        };
        assert!(matches!(
            Program::try_from(raw),
            Err(GridError::NegativeDuration { duration: -1, .. })
        ));
    }

    #[test]
    fn program_deserializes_through_validation() {
        let ok: Program =
            serde_json::from_str(r#"{"title":"Weather","startTime":60000,"duration":1800000}"#)
                .unwrap();
        assert_eq!(ok, Program::new("Weather", 60_000, 1_800_000).unwrap());

        let bad = serde_json::from_str::<Program>(r#"{"title":"Weather","duration":10}"#);
        assert!(bad.is_err());
    }
}
