//! Runtime and dashboard configuration.
//!
//! A [`DashboardConfig`] is layered from two sources, later ones winning:
//!
//! 1. a JSON file: `$CUREROOM_CONFIG` if set (and then required),
//!    otherwise `cureroom.json` in the working directory if present;
//! 2. `CUREROOM_*` environment variables, with `__` between nested keys:
//!    `CUREROOM_BIND_ADDR=0.0.0.0:9000`,
//!    `CUREROOM_RUNTIME__TIMER_PERIOD_MS=500`.
//!
//! Anything neither source sets keeps its default. Durations are written
//! in milliseconds (`"timer_period_ms": 1000`).
//!
//! ```json
//! {
//!   "bind_addr": "0.0.0.0:8080",
//!   "data_dir": "/var/lib/cureroom",
//!   "rooms": [{ "id": "kiln1", "name": "Kiln 1" }],
//!   "runtime": { "sensor_period_ms": null }
//! }
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use cureroom_protocol::RoomId;
use cureroom_supervisor::RoomLayout;
use serde::{Deserialize, Serialize};

use crate::CureroomError;

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Countdown cadence. One `TimerTick` is applied per period.
    #[serde(rename = "timer_period_ms", with = "millis")]
    pub timer_period: Duration,

    /// Sensor sampling cadence. `None` disables polling; readings then
    /// only arrive as `UpdateSensor` commands.
    #[serde(rename = "sensor_period_ms", with = "opt_millis")]
    pub sensor_period: Option<Duration>,

    /// Rows kept in each room's sensor history.
    pub history_capacity: usize,

    /// Bound of each room's command channel.
    pub channel_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer_period: Duration::from_secs(1),
            sensor_period: Some(Duration::from_secs(2)),
            history_capacity: 1440,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomSpec
// ---------------------------------------------------------------------------

/// A room to open at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub id: RoomId,
    /// Display name, used in notifications.
    pub name: String,
    #[serde(default)]
    pub layout: RoomLayout,
}

impl RoomSpec {
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            layout: RoomLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: RoomLayout) -> Self {
        self.layout = layout;
        self
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Everything the dashboard server needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
    /// Directory for persisted snapshots. `None` keeps state in memory.
    pub data_dir: Option<PathBuf>,
    pub rooms: Vec<RoomSpec>,
    pub runtime: RuntimeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_dir: None,
            rooms: (1..=3)
                .map(|n| RoomSpec::new(format!("room{n}").as_str(), format!("Drying Room {n}")))
                .collect(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Names the configuration file to load. When set, the file must exist.
pub const CONFIG_FILE_VAR: &str = "CUREROOM_CONFIG";

/// File read when [`CONFIG_FILE_VAR`] is unset, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "cureroom.json";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CUREROOM";

impl DashboardConfig {
    /// Loads the configuration from the file named by `$CUREROOM_CONFIG`
    /// (or `cureroom.json`, if present) and `CUREROOM_*` overrides.
    pub fn load() -> Result<Self, CureroomError> {
        let (path, required) = match env::var(CONFIG_FILE_VAR) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let config = Self::from_sources(&path, required, env_overrides())?;
        tracing::debug!(file = %path.display(), rooms = config.rooms.len(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path`, which must exist, with `CUREROOM_*` overrides on top.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CureroomError> {
        Ok(Self::from_sources(path.as_ref(), true, env_overrides())?)
    }

    /// Parses a JSON document with no other sources.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    fn from_sources(path: &Path, required: bool, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(required))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
