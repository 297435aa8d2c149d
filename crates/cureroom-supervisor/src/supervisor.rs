//! The room supervisor: one command in, one consistent state out.
//!
//! States are the product `{Manual, Automatic} × {Normal, DoorOpen,
//! EmergencyStopped}`, kept as two independent dimensions (`mode` and the
//! interlock flags) that interact through the invariants on
//! [`RoomState`]. Each command has a single handler below; after it runs,
//! [`RoomSupervisor::settle`] re-establishes the invariants and re-derives
//! the alerts, so no command can leave the room half-updated.

use cureroom_protocol::{Alert, Command, Mode, RoomId, SensorSample};
use serde::{Deserialize, Serialize};

use crate::alerts::derive_alerts;
use crate::config::{COUNTDOWN_SECONDS_RANGE, FAN_COUNT, HEATER_COUNT, RoomLayout};
use crate::snapshot::RoomSnapshot;
use crate::state::{RoomState, RoomStatus};
use crate::timer::TimerState;

/// Something that happened during a transition and that consumers may
/// want to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RoomEvent {
    ModeChanged { mode: Mode },
    DoorOpened,
    DoorClosed,
    EmergencyStopEngaged,
    EmergencyStopReleased,
    /// The countdown reached zero and the alarm is now active.
    DryingComplete,
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Full state after the command.
    pub state: RoomState,
    /// Alerts derived from that state (same as `state.alerts`).
    pub alerts: Vec<Alert>,
    pub events: Vec<RoomEvent>,
    /// Whether the caller should persist a snapshot.
    pub durable: bool,
}

/// Owns and mutates one room's state.
///
/// Not reentrant: one logical task per room drives it. Rooms share
/// nothing, so separate supervisors can run in parallel.
#[derive(Debug, Clone)]
pub struct RoomSupervisor {
    room_id: RoomId,
    state: RoomState,
}

impl RoomSupervisor {
    /// A room with default state and the default sensor layout.
    pub fn new(room_id: RoomId) -> Self {
        Self::with_layout(room_id, &RoomLayout::default())
    }

    /// A room with default state and the given sensor layout.
    pub fn with_layout(room_id: RoomId, layout: &RoomLayout) -> Self {
        let mut supervisor = Self {
            room_id,
            state: RoomState::new(layout),
        };
        supervisor.settle();
        supervisor
    }

    /// Rebuilds a room from a persisted snapshot.
    pub fn from_snapshot(room_id: RoomId, layout: &RoomLayout, snapshot: RoomSnapshot) -> Self {
        let mut supervisor = Self::with_layout(room_id, layout);
        supervisor.restore(snapshot);
        supervisor
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.state.alerts
    }

    pub fn status(&self) -> RoomStatus {
        self.state.status()
    }

    /// The durable part of the current state.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(&self.state)
    }

    /// Replaces the durable part of the state with `snapshot`.
    ///
    /// Sensor readings and the connection flag are kept. The restored
    /// record is normalized: targets re-clamped, an engaged emergency stop
    /// forces manual mode, and automatic mode re-engages the devices and
    /// restarts the countdown if time remains and no interlock is active.
    pub fn restore(&mut self, snapshot: RoomSnapshot) -> Transition {
        let targets = snapshot.targets.normalized();
        let total = match snapshot.timer.total_seconds {
            0 => targets.drying_duration_seconds(),
            seconds => seconds.clamp(*COUNTDOWN_SECONDS_RANGE.start(), *COUNTDOWN_SECONDS_RANGE.end()),
        };

        self.state.mode = snapshot.mode;
        self.state.door_open = snapshot.door_open;
        self.state.emergency_stop = snapshot.emergency_stop;
        self.state.devices = snapshot.devices;
        self.state.targets = targets;
        self.state.timer = TimerState {
            remaining_seconds: snapshot.timer.remaining_seconds.min(total),
            total_seconds: total,
            ..TimerState::new(total)
        };

        if self.state.emergency_stop {
            self.state.mode = Mode::Manual;
        }
        if self.state.mode == Mode::Automatic && !self.state.interlocked() {
            self.state.timer.running = self.state.timer.remaining_seconds > 0;
        }
        self.settle();

        tracing::info!(
            room_id = %self.room_id,
            mode = %self.state.mode,
            status = %self.state.status(),
            "room state restored"
        );
        self.transition(Vec::new(), true)
    }

    /// Applies one command and returns the resulting state.
    ///
    /// Never fails: values are clamped and commands that do not apply in
    /// the current state leave it unchanged.
    pub fn apply(&mut self, command: Command) -> Transition {
        let durable = command.is_durable();
        let mut events = Vec::new();

        match command {
            Command::SetMode { mode } => self.set_mode(mode, &mut events),
            Command::ToggleHeater { index } => self.toggle_heater(index),
            Command::ToggleAirDryer => self.toggle_air_dryer(),
            Command::ToggleFan { index } => self.toggle_fan(index),
            Command::SetDoorOpen { open } => self.set_door_open(open, &mut events),
            Command::SetEmergencyStop { engaged } => self.set_emergency_stop(engaged, &mut events),
            Command::SetTargetTemperature { value } => self.state.targets.set_temperature(value),
            Command::SetTargetHumidity { value } => self.state.targets.set_humidity(value),
            Command::SetDryingDuration { minutes } => self.set_drying_duration(minutes),
            Command::TimerTick => {
                if self.state.timer.tick() {
                    tracing::info!(room_id = %self.room_id, "drying countdown complete");
                    events.push(RoomEvent::DryingComplete);
                }
            }
            Command::ToggleTimerRun => self.toggle_timer_run(),
            Command::ResetTimer => self.reset_timer(),
            Command::MuteAlarm { muted } => self.state.timer.alarm_muted = muted,
            Command::UpdateSensor { sample } => self.update_sensor(sample),
            Command::SetConnectionStatus { online } => {
                if self.state.connection_online != online {
                    tracing::info!(room_id = %self.room_id, online, "sensor link changed");
                }
                self.state.connection_online = online;
            }
        }

        self.settle();
        self.transition(events, durable)
    }

    // -- Mode ---------------------------------------------------------------

    /// Selecting a mode always applies its effect; only a real change
    /// raises `ModeChanged`.
    fn set_mode(&mut self, mode: Mode, events: &mut Vec<RoomEvent>) {
        let previous = self.state.mode;
        match mode {
            Mode::Automatic => {
                if self.state.emergency_stop {
                    tracing::debug!(
                        room_id = %self.room_id,
                        "automatic mode refused while emergency stop is engaged"
                    );
                    return;
                }
                self.state.mode = Mode::Automatic;
                let total = self.state.targets.drying_duration_seconds();
                self.state.timer.rewind(total);
                if !self.state.interlocked() {
                    self.state.devices.engage_automatic();
                    self.state.timer.running = true;
                }
            }
            Mode::Manual => {
                self.state.mode = Mode::Manual;
                self.state.timer.running = false;
            }
        }
        if previous != mode {
            tracing::info!(room_id = %self.room_id, %mode, "operating mode changed");
            events.push(RoomEvent::ModeChanged { mode });
        }
    }

    // -- Devices ------------------------------------------------------------

    /// Whether the operator may drive heaters and the air dryer.
    fn manual_outputs_allowed(&self) -> bool {
        !self.state.interlocked() && self.state.mode == Mode::Manual
    }

    fn toggle_heater(&mut self, index: i64) {
        match device_slot(index, HEATER_COUNT) {
            Some(i) if self.manual_outputs_allowed() => {
                self.state.devices.heaters[i] = !self.state.devices.heaters[i];
            }
            _ => tracing::debug!(room_id = %self.room_id, index, "heater toggle ignored"),
        }
    }

    fn toggle_air_dryer(&mut self) {
        if !self.manual_outputs_allowed() {
            tracing::debug!(room_id = %self.room_id, "air dryer toggle ignored");
            return;
        }
        self.state.devices.air_dryer = !self.state.devices.air_dryer;
    }

    /// Fans stay under operator control in both modes.
    fn toggle_fan(&mut self, index: i64) {
        match device_slot(index, FAN_COUNT) {
            Some(i) if !self.state.interlocked() => {
                self.state.devices.fans[i] = !self.state.devices.fans[i];
            }
            _ => tracing::debug!(room_id = %self.room_id, index, "fan toggle ignored"),
        }
    }

    // -- Interlocks ---------------------------------------------------------

    fn set_door_open(&mut self, open: bool, events: &mut Vec<RoomEvent>) {
        if open == self.state.door_open {
            return;
        }
        self.state.door_open = open;

        if open {
            tracing::warn!(room_id = %self.room_id, "door opened, devices stopped");
            events.push(RoomEvent::DoorOpened);
            return;
        }

        tracing::info!(room_id = %self.room_id, "door closed");
        events.push(RoomEvent::DoorClosed);
        // Resume in place: the countdown keeps the position it had when
        // the door opened.
        if self.state.mode == Mode::Automatic && !self.state.emergency_stop {
            self.state.devices.engage_automatic();
            self.state.timer.running = self.state.timer.remaining_seconds > 0;
        }
    }

    fn set_emergency_stop(&mut self, engaged: bool, events: &mut Vec<RoomEvent>) {
        if engaged {
            // Always force manual, even if the stop was already engaged.
            self.state.mode = Mode::Manual;
        }
        if engaged == self.state.emergency_stop {
            return;
        }
        self.state.emergency_stop = engaged;

        if engaged {
            tracing::warn!(room_id = %self.room_id, "emergency stop engaged");
            events.push(RoomEvent::EmergencyStopEngaged);
        } else {
            // No automatic resume: the operator must re-select a mode.
            tracing::info!(room_id = %self.room_id, "emergency stop released");
            events.push(RoomEvent::EmergencyStopReleased);
        }
    }

    // -- Timer --------------------------------------------------------------

    fn set_drying_duration(&mut self, minutes: i64) {
        self.state.targets.set_drying_duration(minutes);
        // A running countdown keeps going until its next reset.
        if !self.state.timer.running {
            let total = self.state.targets.drying_duration_seconds();
            self.state.timer.rewind(total);
        }
    }

    fn toggle_timer_run(&mut self) {
        if !self.manual_outputs_allowed() {
            tracing::debug!(room_id = %self.room_id, "timer toggle ignored");
            return;
        }
        let timer = &mut self.state.timer;
        if timer.running {
            timer.running = false;
            return;
        }
        if timer.remaining_seconds == 0 {
            timer.rewind(self.state.targets.drying_duration_seconds());
        }
        timer.running = true;
    }

    fn reset_timer(&mut self) {
        if !self.manual_outputs_allowed() {
            tracing::debug!(room_id = %self.room_id, "timer reset ignored");
            return;
        }
        self.state.timer.running = false;
        let total = self.state.targets.drying_duration_seconds();
        self.state.timer.rewind(total);
    }

    // -- Sensors ------------------------------------------------------------

    fn update_sensor(&mut self, sample: SensorSample) {
        match self.state.sensor_mut(sample.kind, sample.sensor_id) {
            Some(reading) => reading.value = Some(sample.value),
            None => tracing::trace!(
                room_id = %self.room_id,
                kind = %sample.kind,
                sensor_id = sample.sensor_id,
                "sample for unknown sensor dropped"
            ),
        }
    }

    // -- Invariants ---------------------------------------------------------

    /// Re-establishes the state invariants and re-derives the alerts.
    fn settle(&mut self) {
        let state = &mut self.state;
        if state.emergency_stop {
            state.mode = Mode::Manual;
        }
        if state.interlocked() {
            state.devices.force_off();
            state.timer.running = false;
        } else if state.mode == Mode::Automatic {
            state.devices.engage_automatic();
        }
        state.alerts = derive_alerts(
            &state.sensors,
            state.door_open,
            state.emergency_stop,
            state.connection_online,
        );
    }

    fn transition(&self, events: Vec<RoomEvent>, durable: bool) -> Transition {
        Transition {
            state: self.state.clone(),
            alerts: self.state.alerts.clone(),
            events,
            durable,
        }
    }
}

/// Array slot for a device index, if it addresses one of `count` devices.
fn device_slot(index: i64, count: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < count)
}
