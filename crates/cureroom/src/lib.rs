//! # cureroom
//!
//! Supervisory runtime for tobacco drying rooms.
//!
//! Each room runs as its own Tokio task around a
//! [`RoomSupervisor`](cureroom_supervisor::RoomSupervisor): commands,
//! the one-second countdown and sensor sampling all funnel through that
//! task, so a room's state is only ever touched by one thing at a time.
//! Durable changes are persisted through a
//! [`SnapshotStore`](cureroom_store::SnapshotStore), and a WebSocket
//! gateway lets dashboards list rooms, send commands and follow updates.
//!
//! ```text
//! Dashboard (JSON/WebSocket) → Gateway → RoomManager → RoomHandle
//!                                                        ↓
//!                     ticks, sensors → room actor → RoomSupervisor
//!                                                        ↓
//!                                     SnapshotStore, subscribers
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cureroom::prelude::*;
//!
//! # async fn demo() -> Result<(), CureroomError> {
//! let mut rooms = RoomManager::new(MemoryStore::new(), RuntimeConfig::default());
//! let room = rooms.open_room(RoomSpec::new("room1", "Drying Room 1")).await?;
//!
//! let update = room.dispatch(Command::SetMode { mode: Mode::Automatic }).await?;
//! assert!(update.state.timer.running);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
pub mod logging;
mod manager;
pub mod message;
pub mod notifications;
mod room;
mod server;

pub use config::{DashboardConfig, RoomSpec, RuntimeConfig};
pub use error::{CureroomError, RoomError};
pub use manager::{RoomManager, RoomSummary};
pub use room::{RoomHandle, RoomInfo, RoomUpdate, UpdateReceiver};
pub use server::{DashboardServer, DashboardServerBuilder};

pub mod prelude {
    pub use crate::message::{ClientMessage, ServerMessage};
    pub use crate::notifications::{Notification, NotificationLog};
    pub use crate::{
        CureroomError, DashboardConfig, DashboardServer, DashboardServerBuilder, RoomError,
        RoomHandle, RoomInfo, RoomManager, RoomSpec, RoomSummary, RoomUpdate, RuntimeConfig,
    };
    pub use cureroom_protocol::{
        Alert, Codec, Command, JsonCodec, Mode, ProtocolError, RoomId, SensorKind, SensorSample,
        Severity,
    };
    pub use cureroom_store::{FileStore, MemoryStore, SnapshotStore, StoreError};
    pub use cureroom_supervisor::{
        RoomEvent, RoomLayout, RoomSnapshot, RoomState, RoomStatus, RoomSupervisor, SensorSpec,
        TimerState, Transition,
    };
    pub use cureroom_telemetry::{
        HistoryRow, SensorHistory, SensorReport, SensorSource, SimulatedSensors, TelemetryError,
        synthetic_profile,
    };
    pub use cureroom_tick::{TickConfig, TickPolicy, TickScheduler};
}
