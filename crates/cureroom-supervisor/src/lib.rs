//! Supervisory state machine for a drying room.
//!
//! A [`RoomSupervisor`] owns one room's [`RoomState`]: its operating mode,
//! the door and emergency-stop interlocks, the setpoints, the device
//! outputs, and the drying countdown. Every mutation goes through
//! [`RoomSupervisor::apply`], which returns a [`Transition`] carrying the
//! new state, the re-derived alert list, and any events raised.
//!
//! The crate is synchronous and has no error type: out-of-range inputs are
//! clamped and commands that do not apply in the current state are
//! ignored. Driving the supervisor from timers, sensor feeds, or a network
//! is the job of the `cureroom` runtime.
//!
//! # Key types
//!
//! - [`RoomSupervisor`]: command dispatch and transition rules
//! - [`RoomState`]: the full room state, with [`Devices`], [`Targets`],
//!   [`TimerState`] and [`SensorReading`]s
//! - [`RoomLayout`]: which sensors a room has and their thresholds
//! - [`RoomSnapshot`]: the persisted subset of a room's state
//! - [`derive_alerts`]: the pure alert derivation

mod alerts;
mod config;
mod snapshot;
mod state;
mod supervisor;
mod timer;

pub use alerts::derive_alerts;
pub use config::{
    DEFAULT_DRYING_DURATION_MINUTES, DEFAULT_TARGET_HUMIDITY, DEFAULT_TARGET_TEMPERATURE,
    DRYING_DURATION_RANGE, FAN_COUNT, HEATER_COUNT, HUMIDITY_RANGE, RoomLayout, SensorSpec,
    TEMPERATURE_RANGE,
};
pub use snapshot::{RoomSnapshot, TimerSnapshot};
pub use state::{Devices, RoomState, RoomStatus, SensorReading, Targets};
pub use supervisor::{RoomEvent, RoomSupervisor, Transition};
pub use timer::TimerState;
