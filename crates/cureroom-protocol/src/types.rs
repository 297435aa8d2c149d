//! Core protocol types.
//!
//! These are the values that cross crate boundaries: the command set the
//! presentation layer sends into a room, the identifiers that address a
//! room, and the advisory [`Alert`] records derived from room state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lenient;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a drying room (for example `"room1"`).
///
/// Serialized as a bare string. Persisted snapshots are keyed by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Operating mode of a room.
///
/// In `Manual` the operator drives each device directly. In `Automatic`
/// the supervisor keeps the heaters and air dryer on and runs the drying
/// countdown itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Automatic => f.write_str("automatic"),
        }
    }
}

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
}

impl SensorKind {
    /// Lowercase name used in alert ids (`"temperature-3-high"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }

    /// Display unit for readings of this kind.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an alert or notification.
///
/// Derived alerts are only ever `Warning` or `Error`; `Info` is used by the
/// notification log for drying completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Alerts and sensor samples
// ---------------------------------------------------------------------------

/// An advisory record derived from room state.
///
/// The `id` is stable across recomputations (`"door-open"`,
/// `"humidity-2-low"`), so consumers can diff successive alert lists to
/// find new alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    pub message: String,
}

/// One reading pushed by a sensor source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    pub sensor_id: u32,
    pub kind: SensorKind,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Every mutation a room accepts.
///
/// Commands are total: none is ever rejected. Out-of-range values are
/// clamped and commands that make no sense in the current state are
/// ignored. Numeric fields accept any JSON number; fractions are rounded
/// and values beyond `i64` saturate, so clamping sees every input.
///
/// Serialized with an internal `"type"` tag:
/// `{ "type": "SetTargetTemperature", "value": 65 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Switch between manual and automatic operation.
    SetMode { mode: Mode },

    /// Flip heater `index` (0-based). Ignored while an interlock is active
    /// or when `index` names no heater.
    ToggleHeater {
        #[serde(deserialize_with = "lenient::integer")]
        index: i64,
    },

    /// Flip the air dryer. Ignored while an interlock is active.
    ToggleAirDryer,

    /// Flip fan `index` (0-based). Ignored while an interlock is active
    /// or when `index` names no fan.
    ToggleFan {
        #[serde(deserialize_with = "lenient::integer")]
        index: i64,
    },

    /// Report the door switch.
    SetDoorOpen { open: bool },

    /// Engage or release the emergency stop.
    SetEmergencyStop { engaged: bool },

    /// Target temperature in °C, clamped to 20..=100.
    SetTargetTemperature {
        #[serde(deserialize_with = "lenient::integer")]
        value: i64,
    },

    /// Target relative humidity in %, clamped to 10..=90.
    SetTargetHumidity {
        #[serde(deserialize_with = "lenient::integer")]
        value: i64,
    },

    /// Drying duration in minutes, clamped to 60..=4320.
    SetDryingDuration {
        #[serde(deserialize_with = "lenient::integer")]
        minutes: i64,
    },

    /// One second of countdown.
    TimerTick,

    /// Start or pause the countdown (manual mode only).
    ToggleTimerRun,

    /// Stop the countdown and rewind it (manual mode only).
    ResetTimer,

    /// Silence or unsilence the completion alarm.
    MuteAlarm { muted: bool },

    /// Replace the latest value of one sensor.
    UpdateSensor { sample: SensorSample },

    /// Report whether the sensor link is up.
    SetConnectionStatus { online: bool },
}

impl Command {
    /// Whether the resulting state should be persisted.
    ///
    /// Target, mode, and device changes are durable. So is the emergency
    /// stop, since engaging it forces the mode back to manual.
    pub fn is_durable(&self) -> bool {
        matches!(
            self,
            Self::SetMode { .. }
                | Self::ToggleHeater { .. }
                | Self::ToggleAirDryer
                | Self::ToggleFan { .. }
                | Self::SetEmergencyStop { .. }
                | Self::SetTargetTemperature { .. }
                | Self::SetTargetHumidity { .. }
                | Self::SetDryingDuration { .. }
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode { .. } => "SetMode",
            Self::ToggleHeater { .. } => "ToggleHeater",
            Self::ToggleAirDryer => "ToggleAirDryer",
            Self::ToggleFan { .. } => "ToggleFan",
            Self::SetDoorOpen { .. } => "SetDoorOpen",
            Self::SetEmergencyStop { .. } => "SetEmergencyStop",
            Self::SetTargetTemperature { .. } => "SetTargetTemperature",
            Self::SetTargetHumidity { .. } => "SetTargetHumidity",
            Self::SetDryingDuration { .. } => "SetDryingDuration",
            Self::TimerTick => "TimerTick",
            Self::ToggleTimerRun => "ToggleTimerRun",
            Self::ResetTimer => "ResetTimer",
            Self::MuteAlarm { .. } => "MuteAlarm",
            Self::UpdateSensor { .. } => "UpdateSensor",
            Self::SetConnectionStatus { .. } => "SetConnectionStatus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_serializes_as_bare_string() {
        let json = serde_json::to_string(&RoomId::new("room1")).unwrap();
        assert_eq!(json, "\"room1\"");
    }

    #[test]
    fn test_mode_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Mode::Automatic).unwrap(), "\"automatic\"");
        let mode: Mode = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(mode, Mode::Manual);
        assert_eq!(Mode::default(), Mode::Manual);
    }

    #[test]
    fn test_command_is_internally_tagged() {
        let json = serde_json::to_value(Command::SetTargetTemperature { value: 65 }).unwrap();
        assert_eq!(json["type"], "SetTargetTemperature");
        assert_eq!(json["value"], 65);

        let cmd: Command = serde_json::from_str(r#"{"type":"ToggleAirDryer"}"#).unwrap();
        assert_eq!(cmd, Command::ToggleAirDryer);
    }

    #[test]
    fn test_numeric_payloads_never_fail_to_decode() {
        let decode = |text: &str| serde_json::from_str::<Command>(text).unwrap();

        assert_eq!(
            decode(r#"{"type":"SetTargetTemperature","value":65.5}"#),
            Command::SetTargetTemperature { value: 66 }
        );
        assert_eq!(
            decode(r#"{"type":"SetTargetTemperature","value":1e20}"#),
            Command::SetTargetTemperature { value: i64::MAX }
        );
        assert_eq!(
            decode(r#"{"type":"SetTargetHumidity","value":99999999999999999999}"#),
            Command::SetTargetHumidity { value: i64::MAX }
        );
        assert_eq!(
            decode(r#"{"type":"SetDryingDuration","minutes":-1e30}"#),
            Command::SetDryingDuration { minutes: i64::MIN }
        );
        assert_eq!(
            decode(r#"{"type":"ToggleHeater","index":-1}"#),
            Command::ToggleHeater { index: -1 }
        );
        assert_eq!(
            decode(r#"{"type":"ToggleFan","index":18446744073709551615}"#),
            Command::ToggleFan { index: i64::MAX }
        );
    }

    #[test]
    fn test_non_numeric_payload_is_rejected() {
        let result = serde_json::from_str::<Command>(r#"{"type":"SetTargetTemperature","value":"hot"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_sensor_parses_nested_sample() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"UpdateSensor","sample":{"sensorId":3,"kind":"temperature","value":72.1}}"#,
        )
        .unwrap();
        let Command::UpdateSensor { sample } = cmd else {
            panic!("expected UpdateSensor");
        };
        assert_eq!(sample.sensor_id, 3);
        assert_eq!(sample.kind, SensorKind::Temperature);
    }

    #[test]
    fn test_durable_commands() {
        assert!(Command::SetMode { mode: Mode::Manual }.is_durable());
        assert!(Command::ToggleFan { index: 1 }.is_durable());
        assert!(Command::SetEmergencyStop { engaged: true }.is_durable());
        assert!(Command::SetDryingDuration { minutes: 90 }.is_durable());
        assert!(!Command::TimerTick.is_durable());
        assert!(!Command::SetDoorOpen { open: true }.is_durable());
        assert!(!Command::MuteAlarm { muted: true }.is_durable());
    }

    #[test]
    fn test_sensor_kind_names() {
        assert_eq!(SensorKind::Temperature.as_str(), "temperature");
        assert_eq!(SensorKind::Humidity.to_string(), "humidity");
        assert_eq!(SensorKind::Humidity.unit(), "%");
    }
}
