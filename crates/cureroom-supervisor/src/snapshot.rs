//! Persisted form of a room.
//!
//! Only the durable part of the state is stored. Sensor readings, alerts,
//! the connection flag, and the alarm flags are rebuilt at runtime, and a
//! restored countdown always starts stopped until the mode rules restart
//! it.

use cureroom_protocol::Mode;
use serde::{Deserialize, Serialize};

use crate::state::{Devices, RoomState, Targets};

/// Countdown position as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub remaining_seconds: u64,
    pub total_seconds: u64,
}

/// The durable record of a room, stored under the room id (latest) and
/// under `"{room_id}-backup"` (manual backup).
///
/// ```json
/// { "mode": "automatic", "doorOpen": false, "emergencyStop": false,
///   "devices": { "heaters": [true, true, true, true], "airDryer": true, "fans": [false, true] },
///   "targets": { "temperatureC": 60, "humidityPct": 45, "dryingDurationMinutes": 1440 },
///   "timer": { "remainingSeconds": 80000, "totalSeconds": 86400 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub mode: Mode,
    pub door_open: bool,
    pub emergency_stop: bool,
    pub devices: Devices,
    pub targets: Targets,
    pub timer: TimerSnapshot,
}

impl From<&RoomState> for RoomSnapshot {
    fn from(state: &RoomState) -> Self {
        Self {
            mode: state.mode,
            door_open: state.door_open,
            emergency_stop: state.emergency_stop,
            devices: state.devices,
            targets: state.targets,
            timer: TimerSnapshot {
                remaining_seconds: state.timer.remaining_seconds,
                total_seconds: state.timer.total_seconds,
            },
        }
    }
}

impl Default for RoomSnapshot {
    fn default() -> Self {
        Self::from(&RoomState::default())
    }
}
