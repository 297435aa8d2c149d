//! Sensor input and reading history for drying rooms.
//!
//! - [`SensorSource`] is what a room actor polls on each sampling tick.
//!   [`SimulatedSensors`] is a random-walk stand-in for real probes.
//! - [`SensorHistory`] keeps a bounded trail of readings and renders it
//!   as CSV.
//! - [`synthetic_profile`] fabricates a day of plausible hourly rows for
//!   seeding an empty history.

mod error;
mod history;
mod profile;
mod simulated;

pub use error::TelemetryError;
pub use history::{HistoryRow, SensorHistory, column_names};
pub use profile::synthetic_profile;
pub use simulated::SimulatedSensors;

use cureroom_protocol::SensorSample;

/// One poll of a sensor source.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReport {
    /// Whether the sensor link is up. An offline report carries no samples.
    pub online: bool,
    pub samples: Vec<SensorSample>,
}

/// Something a room can read its sensors from.
pub trait SensorSource: Send + 'static {
    fn poll(&mut self) -> SensorReport;
}

impl<F> SensorSource for F
where
    F: FnMut() -> SensorReport + Send + 'static,
{
    fn poll(&mut self) -> SensorReport {
        self()
    }
}
