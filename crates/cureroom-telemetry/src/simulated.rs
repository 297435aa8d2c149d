use cureroom_protocol::{SensorKind, SensorSample};
use cureroom_supervisor::{RoomLayout, SensorSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, trace};

use crate::{SensorReport, SensorSource};

const TEMPERATURE_START: [f64; 4] = [65.2, 68.7, 72.1, 67.5];
const HUMIDITY_START: [f64; 2] = [45.0, 58.0];

const TEMPERATURE_STEP: f64 = 0.5;
const HUMIDITY_STEP: f64 = 0.8;

/// How far past a threshold the walk may drift.
const DRIFT_MARGIN: f64 = 5.0;

/// Chance per poll that the link flips between online and offline.
const LINK_FLIP_PROBABILITY: f64 = 0.01;

/// Random-walk sensor source.
///
/// Each poll nudges every probe by a uniform step (±0.5 °C, ±0.8 %)
/// and keeps it within five units of its band. The link occasionally
/// drops and comes back.
#[derive(Debug)]
pub struct SimulatedSensors {
    probes: Vec<(SensorSpec, f64)>,
    online: bool,
    rng: StdRng,
}

impl SimulatedSensors {
    pub fn new(layout: &RoomLayout) -> Self {
        Self::with_rng(layout, StdRng::from_os_rng())
    }

    /// Deterministic source for tests.
    pub fn seeded(layout: &RoomLayout, seed: u64) -> Self {
        Self::with_rng(layout, StdRng::seed_from_u64(seed))
    }

    fn with_rng(layout: &RoomLayout, rng: StdRng) -> Self {
        let mut temperature = TEMPERATURE_START.iter();
        let mut humidity = HUMIDITY_START.iter();
        let probes = layout
            .sensors
            .iter()
            .map(|spec| {
                let preset = match spec.kind {
                    SensorKind::Temperature => temperature.next(),
                    SensorKind::Humidity => humidity.next(),
                };
                let start = preset
                    .copied()
                    .unwrap_or((spec.min_threshold + spec.max_threshold) / 2.0);
                (*spec, start)
            })
            .collect();

        Self {
            probes,
            online: true,
            rng,
        }
    }

    /// Current simulated value of each probe, in layout order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.probes.iter().map(|(_, v)| *v)
    }
}

impl SensorSource for SimulatedSensors {
    fn poll(&mut self) -> SensorReport {
        for (spec, value) in &mut self.probes {
            let step = match spec.kind {
                SensorKind::Temperature => TEMPERATURE_STEP,
                SensorKind::Humidity => HUMIDITY_STEP,
            };
            let next = *value + self.rng.random_range(-step..=step);
            *value = next.clamp(
                spec.min_threshold - DRIFT_MARGIN,
                spec.max_threshold + DRIFT_MARGIN,
            );
        }

        if self.rng.random_bool(LINK_FLIP_PROBABILITY) {
            self.online = !self.online;
            info!(online = self.online, "simulated sensor link flipped");
        }

        let samples = if self.online {
            self.probes
                .iter()
                .map(|(spec, value)| SensorSample {
                    sensor_id: spec.id,
                    kind: spec.kind,
                    value: *value,
                })
                .collect()
        } else {
            Vec::new()
        };
        trace!(online = self.online, samples = samples.len(), "sensors polled");

        SensorReport {
            online: self.online,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_from_reference_values() {
        let sensors = SimulatedSensors::seeded(&RoomLayout::default(), 1);
        let values: Vec<f64> = sensors.values().collect();
        assert_eq!(values, vec![65.2, 68.7, 72.1, 67.5, 45.0, 58.0]);
    }

    #[test]
    fn test_extra_probes_start_mid_band() {
        let mut layout = RoomLayout::default();
        layout.sensors.push(SensorSpec {
            id: 5,
            kind: SensorKind::Temperature,
            min_threshold: 50.0,
            max_threshold: 60.0,
        });
        let sensors = SimulatedSensors::seeded(&layout, 1);
        assert_eq!(sensors.values().nth(6), Some(55.0));
    }

    #[test]
    fn test_walk_steps_are_bounded_and_clamped() {
        let layout = RoomLayout::default();
        let mut sensors = SimulatedSensors::seeded(&layout, 7);
        let mut previous: Vec<f64> = sensors.values().collect();

        for _ in 0..5000 {
            let report = sensors.poll();
            let current: Vec<f64> = sensors.values().collect();
            for ((spec, before), after) in layout.sensors.iter().zip(&previous).zip(&current) {
                let step = match spec.kind {
                    SensorKind::Temperature => TEMPERATURE_STEP,
                    SensorKind::Humidity => HUMIDITY_STEP,
                };
                assert!((after - before).abs() <= step + 1e-9);
                assert!(*after >= spec.min_threshold - DRIFT_MARGIN);
                assert!(*after <= spec.max_threshold + DRIFT_MARGIN);
            }
            if report.online {
                assert_eq!(report.samples.len(), layout.sensors.len());
            } else {
                assert!(report.samples.is_empty());
            }
            previous = current;
        }
    }

    #[test]
    fn test_link_eventually_flaps() {
        let mut sensors = SimulatedSensors::seeded(&RoomLayout::default(), 42);
        let offline = (0..5000).filter(|_| !sensors.poll().online).count();
        assert!(offline > 0);
    }
}
