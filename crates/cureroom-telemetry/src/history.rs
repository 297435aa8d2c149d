use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use cureroom_protocol::SensorKind;
use cureroom_supervisor::{RoomLayout, SensorReading};
use csv::{Terminator, WriterBuilder};
use serde::Serialize;

use crate::TelemetryError;

/// One sampling instant: a value (or a gap) per sensor, in layout order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}

/// CSV column names for `layout`: `Temperature1..n`, then `Humidity1..n`,
/// numbered per kind in layout order.
pub fn column_names(layout: &RoomLayout) -> Vec<String> {
    let mut temperature = 0;
    let mut humidity = 0;
    layout
        .sensors
        .iter()
        .map(|spec| match spec.kind {
            SensorKind::Temperature => {
                temperature += 1;
                format!("Temperature{temperature}")
            }
            SensorKind::Humidity => {
                humidity += 1;
                format!("Humidity{humidity}")
            }
        })
        .collect()
}

/// Bounded trail of sensor readings. The oldest row is evicted once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    columns: Vec<String>,
    capacity: usize,
    rows: VecDeque<HistoryRow>,
}

impl SensorHistory {
    pub fn new(layout: &RoomLayout, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            columns: column_names(layout),
            capacity,
            rows: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    /// Records the current readings of a room.
    pub fn record(&mut self, timestamp: DateTime<Utc>, readings: &[SensorReading]) {
        self.push(HistoryRow {
            timestamp,
            values: readings.iter().map(|r| r.value).collect(),
        });
    }

    pub fn push(&mut self, row: HistoryRow) {
        if self.rows.len() == self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = HistoryRow>) {
        for row in rows {
            self.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rows(&self) -> impl Iterator<Item = &HistoryRow> {
        self.rows.iter()
    }

    pub fn latest(&self) -> Option<&HistoryRow> {
        self.rows.back()
    }

    /// Renders the history as CSV: a `Timestamp,<columns>` header then one
    /// line per row, oldest first. Values have one decimal place; a gap is
    /// an empty field.
    pub fn export_csv(&self) -> Result<String, TelemetryError> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let header = std::iter::once("Timestamp").chain(self.columns.iter().map(String::as_str));
        writer.write_record(header)?;
        for row in &self.rows {
            let timestamp = row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
            let values = row
                .values
                .iter()
                .map(|value| value.map(|v| format!("{v:.1}")).unwrap_or_default());
            writer.write_record(std::iter::once(timestamp).chain(values))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }
}
