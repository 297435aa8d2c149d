//! Room state: devices, setpoints, sensor readings, and derived status.

use cureroom_protocol::{Alert, Mode, SensorKind};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_DRYING_DURATION_MINUTES, DEFAULT_TARGET_HUMIDITY, DEFAULT_TARGET_TEMPERATURE,
    DRYING_DURATION_RANGE, FAN_COUNT, HEATER_COUNT, HUMIDITY_RANGE, RoomLayout,
    TEMPERATURE_RANGE, clamp_to,
};
use crate::timer::TimerState;

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Device outputs of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    pub heaters: [bool; HEATER_COUNT],
    pub air_dryer: bool,
    pub fans: [bool; FAN_COUNT],
}

impl Devices {
    /// Returns `true` if any output is on.
    pub fn any_on(&self) -> bool {
        self.air_dryer || self.heaters.iter().chain(self.fans.iter()).any(|on| *on)
    }

    /// Turns every output off.
    pub(crate) fn force_off(&mut self) {
        *self = Self::default();
    }

    /// Heaters and air dryer on; fans are left to the operator.
    pub(crate) fn engage_automatic(&mut self) {
        self.heaters = [true; HEATER_COUNT];
        self.air_dryer = true;
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Operator setpoints. Always within their documented ranges.
///
/// Setpoints are advisory: they do not drive the devices. Actuation comes
/// from device toggles or from automatic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targets {
    temperature_c: u32,
    humidity_pct: u32,
    drying_duration_minutes: u32,
}

impl Targets {
    /// Builds a setpoint set, clamping each value into range.
    pub fn new(temperature_c: i64, humidity_pct: i64, drying_duration_minutes: i64) -> Self {
        Self {
            temperature_c: clamp_to(temperature_c, &TEMPERATURE_RANGE),
            humidity_pct: clamp_to(humidity_pct, &HUMIDITY_RANGE),
            drying_duration_minutes: clamp_to(drying_duration_minutes, &DRYING_DURATION_RANGE),
        }
    }

    pub fn temperature_c(&self) -> u32 {
        self.temperature_c
    }

    pub fn humidity_pct(&self) -> u32 {
        self.humidity_pct
    }

    pub fn drying_duration_minutes(&self) -> u32 {
        self.drying_duration_minutes
    }

    /// Drying duration in seconds. At least 3600.
    pub fn drying_duration_seconds(&self) -> u64 {
        u64::from(self.drying_duration_minutes) * 60
    }

    pub(crate) fn set_temperature(&mut self, value: i64) {
        self.temperature_c = clamp_to(value, &TEMPERATURE_RANGE);
    }

    pub(crate) fn set_humidity(&mut self, value: i64) {
        self.humidity_pct = clamp_to(value, &HUMIDITY_RANGE);
    }

    pub(crate) fn set_drying_duration(&mut self, minutes: i64) {
        self.drying_duration_minutes = clamp_to(minutes, &DRYING_DURATION_RANGE);
    }

    /// Re-clamps every field. Used on values that came from outside the
    /// supervisor (persisted snapshots).
    pub(crate) fn normalized(self) -> Self {
        Self::new(
            i64::from(self.temperature_c),
            i64::from(self.humidity_pct),
            i64::from(self.drying_duration_minutes),
        )
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            temperature_c: DEFAULT_TARGET_TEMPERATURE,
            humidity_pct: DEFAULT_TARGET_HUMIDITY,
            drying_duration_minutes: DEFAULT_DRYING_DURATION_MINUTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Latest value of one sensor together with its acceptable band.
///
/// `value` is `None` until the sensor source has reported at least once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: u32,
    pub kind: SensorKind,
    pub value: Option<f64>,
    pub min_threshold: f64,
    pub max_threshold: f64,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Presented safety status of a room.
///
/// When both interlocks are active the emergency stop wins; the effect on
/// the devices is the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Normal,
    DoorOpen,
    EmergencyStopped,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::DoorOpen => write!(f, "Door Open"),
            Self::EmergencyStopped => write!(f, "Emergency Stopped"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The complete state of one room.
///
/// Invariants, re-established after every command:
///
/// - door open or emergency stop ⇒ every device off and the timer stopped
/// - emergency stop ⇒ manual mode
/// - automatic mode without an interlock ⇒ heaters and air dryer on
/// - targets within range
/// - `alerts` equals [`derive_alerts`](crate::derive_alerts) of the current
///   inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub mode: Mode,
    pub door_open: bool,
    pub emergency_stop: bool,
    pub connection_online: bool,
    pub devices: Devices,
    pub targets: Targets,
    pub timer: TimerState,
    pub sensors: Vec<SensorReading>,
    pub alerts: Vec<Alert>,
}

impl RoomState {
    /// Fresh room: manual, interlocks clear, devices off, default targets,
    /// one empty reading per sensor in `layout`.
    pub fn new(layout: &RoomLayout) -> Self {
        let targets = Targets::default();
        Self {
            mode: Mode::Manual,
            door_open: false,
            emergency_stop: false,
            connection_online: true,
            devices: Devices::default(),
            timer: TimerState::new(targets.drying_duration_seconds()),
            targets,
            sensors: layout
                .sensors
                .iter()
                .map(|spec| SensorReading {
                    id: spec.id,
                    kind: spec.kind,
                    value: None,
                    min_threshold: spec.min_threshold,
                    max_threshold: spec.max_threshold,
                })
                .collect(),
            alerts: Vec::new(),
        }
    }

    /// Returns `true` if the door is open or the emergency stop is engaged.
    pub fn interlocked(&self) -> bool {
        self.door_open || self.emergency_stop
    }

    /// Presented status, with the emergency stop taking precedence.
    pub fn status(&self) -> RoomStatus {
        if self.emergency_stop {
            RoomStatus::EmergencyStopped
        } else if self.door_open {
            RoomStatus::DoorOpen
        } else {
            RoomStatus::Normal
        }
    }

    /// Finds the reading for a sensor.
    pub fn sensor(&self, kind: SensorKind, id: u32) -> Option<&SensorReading> {
        self.sensors.iter().find(|s| s.kind == kind && s.id == id)
    }

    pub(crate) fn sensor_mut(&mut self, kind: SensorKind, id: u32) -> Option<&mut SensorReading> {
        self.sensors.iter_mut().find(|s| s.kind == kind && s.id == id)
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new(&RoomLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = RoomState::default();
        assert_eq!(state.mode, Mode::Manual);
        assert!(!state.interlocked());
        assert!(!state.devices.any_on());
        assert_eq!(state.targets.temperature_c(), 60);
        assert_eq!(state.targets.humidity_pct(), 45);
        assert_eq!(state.targets.drying_duration_minutes(), 1440);
        assert_eq!(state.timer.total_seconds, 86_400);
        assert_eq!(state.sensors.len(), 6);
        assert!(state.sensors.iter().all(|s| s.value.is_none()));
    }

    #[test]
    fn test_status_prefers_emergency_stop() {
        let mut state = RoomState::default();
        assert_eq!(state.status(), RoomStatus::Normal);
        state.door_open = true;
        assert_eq!(state.status(), RoomStatus::DoorOpen);
        state.emergency_stop = true;
        assert_eq!(state.status(), RoomStatus::EmergencyStopped);
        assert_eq!(state.status().to_string(), "Emergency Stopped");
    }

    #[test]
    fn test_targets_new_clamps() {
        let t = Targets::new(500, 0, 10_000);
        assert_eq!(t.temperature_c(), 100);
        assert_eq!(t.humidity_pct(), 10);
        assert_eq!(t.drying_duration_minutes(), 4320);
        assert_eq!(t.drying_duration_seconds(), 4320 * 60);
    }

    #[test]
    fn test_devices_engage_automatic_leaves_fans() {
        let mut d = Devices {
            fans: [true, false],
            ..Devices::default()
        };
        d.engage_automatic();
        assert_eq!(d.heaters, [true; HEATER_COUNT]);
        assert!(d.air_dryer);
        assert_eq!(d.fans, [true, false]);
        d.force_off();
        assert!(!d.any_on());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_value(RoomState::default()).unwrap();
        assert_eq!(json["doorOpen"], false);
        assert_eq!(json["devices"]["airDryer"], false);
        assert_eq!(json["targets"]["dryingDurationMinutes"], 1440);
        assert_eq!(json["mode"], "manual");
    }
}
