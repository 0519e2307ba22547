//! Active-hours gate over local-time minute-of-day.

use crate::spec::ActiveRange;
use chrono::{NaiveTime, Timelike};

/// A parsed `HH:MM`–`HH:MM` range in minutes since midnight. `from > to`
/// wraps midnight: 22:00–06:00 covers late evening and early morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    from_min: u32,
    to_min: u32,
}

impl ActiveWindow {
    pub fn parse(range: &ActiveRange) -> Option<Self> {
        let from = NaiveTime::parse_from_str(&range.from, "%H:%M").ok()?;
        let to = NaiveTime::parse_from_str(&range.to, "%H:%M").ok()?;
        Some(Self {
            from_min: from.hour() * 60 + from.minute(),
            to_min: to.hour() * 60 + to.minute(),
        })
    }

    pub fn contains(&self, minutes: u32) -> bool {
        if self.from_min <= self.to_min {
            self.from_min <= minutes && minutes <= self.to_min
        } else {
            minutes >= self.from_min || minutes <= self.to_min
        }
    }
}

/// True when no windows are declared or the current minute lies in at
/// least one of them.
pub fn within_active_hours(windows: &[ActiveWindow], minutes: u32) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.contains(minutes))
}
