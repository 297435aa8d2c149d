//! Setpoint limits and the sensor layout of a room.

use std::ops::RangeInclusive;

use cureroom_protocol::SensorKind;
use serde::{Deserialize, Serialize};

/// Number of heaters in a room.
pub const HEATER_COUNT: usize = 4;

/// Number of circulation fans in a room.
pub const FAN_COUNT: usize = 2;

/// Accepted target temperature, °C.
pub const TEMPERATURE_RANGE: RangeInclusive<i64> = 20..=100;

/// Accepted target relative humidity, %.
pub const HUMIDITY_RANGE: RangeInclusive<i64> = 10..=90;

/// Accepted drying duration, minutes (1 h to 72 h).
///
/// The lower bound keeps `TimerState::total_seconds` at 3600 or more, so
/// progress never divides by zero.
pub const DRYING_DURATION_RANGE: RangeInclusive<i64> = 60..=4320;

/// Countdown lengths a restored snapshot may carry, seconds.
pub(crate) const COUNTDOWN_SECONDS_RANGE: RangeInclusive<u64> = 60 * 60..=4320 * 60;

pub const DEFAULT_TARGET_TEMPERATURE: u32 = 60;
pub const DEFAULT_TARGET_HUMIDITY: u32 = 45;
pub const DEFAULT_DRYING_DURATION_MINUTES: u32 = 1440;

/// Clamps `value` into `range` and narrows it to `u32`.
pub(crate) fn clamp_to(value: i64, range: &RangeInclusive<i64>) -> u32 {
    // Every range above lies inside u32, so the cast cannot truncate.
    value.clamp(*range.start(), *range.end()) as u32
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// One sensor slot in a room and its acceptable band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSpec {
    pub id: u32,
    pub kind: SensorKind,
    pub min_threshold: f64,
    pub max_threshold: f64,
}

/// The sensors fitted in a room, in display order.
///
/// The default layout is four temperature sensors with a 60–70 °C band and
/// two humidity sensors with a 40–60 % band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLayout {
    pub sensors: Vec<SensorSpec>,
}

impl RoomLayout {
    /// Specs of one kind, in layout order.
    pub fn of_kind(&self, kind: SensorKind) -> impl Iterator<Item = &SensorSpec> {
        self.sensors.iter().filter(move |s| s.kind == kind)
    }
}

impl Default for RoomLayout {
    fn default() -> Self {
        let temperature = (1..=4).map(|id| SensorSpec {
            id,
            kind: SensorKind::Temperature,
            min_threshold: 60.0,
            max_threshold: 70.0,
        });
        let humidity = (1..=2).map(|id| SensorSpec {
            id,
            kind: SensorKind::Humidity,
            min_threshold: 40.0,
            max_threshold: 60.0,
        });
        Self {
            sensors: temperature.chain(humidity).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_bounds() {
        assert_eq!(clamp_to(500, &TEMPERATURE_RANGE), 100);
        assert_eq!(clamp_to(-5, &TEMPERATURE_RANGE), 20);
        assert_eq!(clamp_to(55, &HUMIDITY_RANGE), 55);
        assert_eq!(clamp_to(0, &DRYING_DURATION_RANGE), 60);
        assert_eq!(clamp_to(i64::MAX, &DRYING_DURATION_RANGE), 4320);
    }

    #[test]
    fn test_default_layout() {
        let layout = RoomLayout::default();
        assert_eq!(layout.sensors.len(), 6);
        assert_eq!(layout.of_kind(SensorKind::Temperature).count(), 4);
        let hum: Vec<_> = layout.of_kind(SensorKind::Humidity).collect();
        assert_eq!(hum.len(), 2);
        assert_eq!(hum[0].min_threshold, 40.0);
        assert_eq!(hum[1].id, 2);
    }
}
