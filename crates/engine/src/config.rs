//! Controller configuration.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{Millis, Slot, DEFAULT_FETCH_SLOTS, DEFAULT_TIMELINE_UNIT_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgConfig {
    /// Width of one column in milliseconds.
    pub timeline_unit_ms: Millis,
    /// Initial anchor of the timeline window, in slots.
    pub timeline_offset: Slot,
    /// Slots requested per scroll step.
    pub fetch_slots: i64,
    /// Fixed UTC offset used for program labels.
    pub label_utc_offset_minutes: i32,
    /// Optional JSON schedule backing the in-memory source.
    pub schedule_path: Option<PathBuf>,
}

impl Default for EpgConfig {
    fn default() -> Self {
        Self {
            timeline_unit_ms: DEFAULT_TIMELINE_UNIT_MS,
            timeline_offset: 0,
            fetch_slots: DEFAULT_FETCH_SLOTS,
            label_utc_offset_minutes: 0,
            schedule_path: None,
        }
    }
}

impl EpgConfig {
    /// Create from environment variables.
    ///
    /// Unparsable values fall back to their defaults. The timeline offset
    /// defaults to the slot containing the current time.
    pub fn from_env() -> Self {
        use std::env;

        let timeline_unit_ms = env::var("EPG_TIMELINE_UNIT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMELINE_UNIT_MS);

        let timeline_offset = env::var("EPG_TIMELINE_OFFSET")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                if timeline_unit_ms > 0 {
                    now_ms().div_euclid(timeline_unit_ms)
                } else {
                    0
                }
            });

        let fetch_slots = env::var("EPG_FETCH_SLOTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FETCH_SLOTS);

        let label_utc_offset_minutes = env::var("EPG_LABEL_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let schedule_path = env::var("EPG_SCHEDULE_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(PathBuf::from(s)) });

        Self {
            timeline_unit_ms,
            timeline_offset,
            fetch_slots,
            label_utc_offset_minutes,
            schedule_path,
        }
    }

    /// Absolute start time of the configured anchor slot.
    pub fn anchor_ms(&self) -> Millis {
        self.timeline_offset.saturating_mul(self.timeline_unit_ms)
    }
}

/// Wall clock in milliseconds since the Unix epoch.
pub fn now_ms() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_half_hour_columns() {
        let config = EpgConfig::default();
        assert_eq!(config.timeline_unit_ms, 30 * 60 * 1000);
        assert_eq!(config.fetch_slots, DEFAULT_FETCH_SLOTS);
        assert_eq!(config.anchor_ms(), 0);
    }

    #[test]
    fn anchor_scales_offset_by_unit() {
        let config = EpgConfig {
            timeline_unit_ms: 1000,
            timeline_offset: 7,
            ..EpgConfig::default()
        };
        assert_eq!(config.anchor_ms(), 7000);
    }
}
