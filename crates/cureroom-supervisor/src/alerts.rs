//! Alert derivation.
//!
//! Alerts are never stored independently: they are recomputed from the
//! current inputs after every command and replace the previous list
//! wholesale. Ids are stable so consumers can diff.

use cureroom_protocol::{Alert, Severity};

use crate::state::SensorReading;

pub const DOOR_OPEN_ALERT_ID: &str = "door-open";
pub const EMERGENCY_STOP_ALERT_ID: &str = "emergency-stop";
pub const CONNECTION_ALERT_ID: &str = "connection-error";

/// Derives the alert list from the room's inputs.
///
/// Order is fixed: door, emergency stop, connection, then one entry per
/// out-of-band sensor in sensor order. A reading below its band is a
/// `Warning`, above its band an `Error`. Readings exactly on a threshold,
/// and sensors that have not reported yet, raise nothing.
pub fn derive_alerts(
    sensors: &[SensorReading],
    door_open: bool,
    emergency_stop: bool,
    connection_online: bool,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if door_open {
        alerts.push(Alert {
            id: DOOR_OPEN_ALERT_ID.to_string(),
            severity: Severity::Warning,
            message: "Door Open".to_string(),
        });
    }
    if emergency_stop {
        alerts.push(Alert {
            id: EMERGENCY_STOP_ALERT_ID.to_string(),
            severity: Severity::Error,
            message: "Emergency Stop Activated".to_string(),
        });
    }
    if !connection_online {
        alerts.push(Alert {
            id: CONNECTION_ALERT_ID.to_string(),
            severity: Severity::Error,
            message: "Communication error. Check network connection.".to_string(),
        });
    }

    alerts.extend(sensors.iter().filter_map(sensor_alert));
    alerts
}

fn sensor_alert(sensor: &SensorReading) -> Option<Alert> {
    let value = sensor.value?;
    let (suffix, severity, bound) = if value < sensor.min_threshold {
        ("low", Severity::Warning, sensor.min_threshold)
    } else if value > sensor.max_threshold {
        ("high", Severity::Error, sensor.max_threshold)
    } else {
        return None;
    };

    let kind = sensor.kind.as_str();
    let unit = sensor.kind.unit();
    Some(Alert {
        id: format!("{kind}-{}-{suffix}", sensor.id),
        severity,
        message: format!(
            "Sensor {} {kind} too {suffix}: {value:.1}{unit} (limit {bound:.1}{unit})",
            sensor.id
        ),
    })
}

#[cfg(test)]
mod tests {
    use cureroom_protocol::SensorKind;

    use super::*;

    fn temp(id: u32, value: f64) -> SensorReading {
        SensorReading {
            id,
            kind: SensorKind::Temperature,
            value: Some(value),
            min_threshold: 60.0,
            max_threshold: 70.0,
        }
    }

    fn ids(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_high_reading_is_error() {
        let alerts = derive_alerts(&[temp(1, 75.0)], false, false, true);
        assert_eq!(ids(&alerts), ["temperature-1-high"]);
        assert_eq!(alerts[0].severity, Severity::Error);
        assert!(alerts[0].message.contains("75.0"));
    }

    #[test]
    fn test_low_reading_is_warning() {
        let alerts = derive_alerts(&[temp(1, 55.0)], false, false, true);
        assert_eq!(ids(&alerts), ["temperature-1-low"]);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn test_in_band_and_boundary_readings_raise_nothing() {
        let sensors = [temp(1, 65.0), temp(2, 60.0), temp(3, 70.0)];
        assert!(derive_alerts(&sensors, false, false, true).is_empty());
    }

    #[test]
    fn test_unreported_sensor_raises_nothing() {
        let mut s = temp(1, 0.0);
        s.value = None;
        assert!(derive_alerts(&[s], false, false, true).is_empty());
    }

    #[test]
    fn test_humidity_ids_use_kind_name() {
        let s = SensorReading {
            id: 2,
            kind: SensorKind::Humidity,
            value: Some(61.5),
            min_threshold: 40.0,
            max_threshold: 60.0,
        };
        let alerts = derive_alerts(&[s], false, false, true);
        assert_eq!(ids(&alerts), ["humidity-2-high"]);
    }

    #[test]
    fn test_interlock_and_connection_alerts_come_first() {
        let alerts = derive_alerts(&[temp(4, 71.0)], true, true, false);
        assert_eq!(
            ids(&alerts),
            ["door-open", "emergency-stop", "connection-error", "temperature-4-high"]
        );
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[1].severity, Severity::Error);
        assert_eq!(alerts[2].severity, Severity::Error);
    }
}
