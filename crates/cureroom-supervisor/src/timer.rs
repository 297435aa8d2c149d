//! Drying countdown.
//!
//! A one-shot second counter. The supervisor owns when it runs; this
//! module only knows how to count down, rewind, and describe itself.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Countdown state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub remaining_seconds: u64,
    pub running: bool,
    /// Length of the countdown at its last (re)start.
    pub total_seconds: u64,
    pub alarm_active: bool,
    pub alarm_muted: bool,
}

impl TimerState {
    /// A stopped countdown of `total_seconds`.
    pub fn new(total_seconds: u64) -> Self {
        Self {
            remaining_seconds: total_seconds,
            running: false,
            total_seconds,
            alarm_active: false,
            alarm_muted: false,
        }
    }

    /// Rewinds to a new length without changing `running`.
    pub(crate) fn rewind(&mut self, total_seconds: u64) {
        self.total_seconds = total_seconds;
        self.remaining_seconds = total_seconds;
        self.alarm_active = false;
    }

    /// Counts one second. Returns `true` when this tick finished the
    /// countdown.
    pub(crate) fn tick(&mut self) -> bool {
        if !self.running || self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.running = false;
            self.alarm_active = true;
            return true;
        }
        false
    }

    /// Fraction of the countdown still to go, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.remaining_seconds as f64 / self.total_seconds as f64).clamp(0.0, 1.0)
    }

    /// Remaining time as `HH:MM:SS`. Hours are not wrapped at 24.
    pub fn format_hms(&self) -> String {
        let s = self.remaining_seconds;
        format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }

    /// When the countdown will reach zero if left running, or `None` while
    /// it is stopped.
    pub fn estimated_completion(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.running {
            return None;
        }
        let remaining = i64::try_from(self.remaining_seconds).ok()?;
        now.checked_add_signed(ChronoDuration::seconds(remaining))
    }

    /// Whether the completion alarm should currently sound.
    pub fn alarm_audible(&self) -> bool {
        self.alarm_active && !self.alarm_muted
    }
}
