//! Program label formatting.
//!
//! Labels read `"{hour}:{minute}, {slots}, {title}"`, e.g. `"9:5, 2, News"`.
//! Hour and minute are unpadded and rendered in one fixed UTC offset.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

use crate::program::{Program, TimelineUnit};
use crate::types::Millis;

/// Formats visible-cell labels in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelClock {
    offset: FixedOffset,
}

impl LabelClock {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Clock shifted by `minutes` east of UTC. Returns None past ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Zero-padded `HH:MM` of an absolute time, for column headers.
    pub fn clock_time(&self, time: Millis) -> String {
        match DateTime::from_timestamp_millis(time) {
            Some(utc) => {
                let local = utc.with_timezone(&self.offset);
                format!("{:02}:{:02}", local.hour(), local.minute())
            }
            None => "--:--".to_string(),
        }
    }

    pub fn label(&self, program: &Program, unit: TimelineUnit) -> String {
        let clock = match DateTime::from_timestamp_millis(program.start_time) {
            Some(utc) => {
                let local = utc.with_timezone(&self.offset);
                format!("{}:{}", local.hour(), local.minute())
            }
            None => "--:--".to_string(),
        };
        format!(
            "{}, {}, {}",
            clock,
            unit.slots_for(program.duration),
            program.title
        )
    }
}

impl Default for LabelClock {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_uses_unpadded_clock_and_slot_count() {
        let unit = TimelineUnit::new(30 * 60 * 1000).unwrap();
        // 1970-01-01T09:05:00Z
        let p = Program::new("News", (9 * 60 + 5) * 60 * 1000, 45 * 60 * 1000).unwrap();
        assert_eq!(LabelClock::utc().label(&p, unit), "9:5, 2, News");
    }

    #[test]
    fn label_applies_fixed_offset() {
        let unit = TimelineUnit::new(1).unwrap();
        let p = Program::new("Cartoons", 0, 3).unwrap();
        let clock = LabelClock::from_offset_minutes(90).unwrap();
        assert_eq!(clock.label(&p, unit), "1:30, 3, Cartoons");
    }

    #[test]
    fn clock_time_is_padded() {
        let clock = LabelClock::from_offset_minutes(-60).unwrap();
        // 1970-01-01T09:05:00Z is 08:05 one hour west
        assert_eq!(clock.clock_time((9 * 60 + 5) * 60 * 1000), "08:05");
        assert_eq!(LabelClock::utc().clock_time(0), "00:00");
    }

    #[test]
    fn offset_outside_a_day_is_rejected() {
        assert!(LabelClock::from_offset_minutes(24 * 60).is_none());
        assert!(LabelClock::from_offset_minutes(-23 * 60).is_some());
    }
}
