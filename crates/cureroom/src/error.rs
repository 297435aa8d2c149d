//! Error types for the runtime and the unified [`CureroomError`].

use cureroom_protocol::{ProtocolError, RoomId};
use cureroom_store::StoreError;
use cureroom_telemetry::TelemetryError;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while talking to a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this id is open.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with this id is already open.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The room's actor has stopped or its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The id cannot be used as a storage namespace.
    #[error("invalid room id {0}: {1}")]
    InvalidId(RoomId, #[source] StoreError),

    /// `load_backup` was called but no backup has been saved.
    #[error("room {0} has no backup")]
    NoBackup(RoomId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum CureroomError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// WebSocket handshake or frame I/O failed.
    #[error("gateway error: {0}")]
    Gateway(Box<tungstenite::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<tungstenite::Error> for CureroomError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Gateway(Box::new(err))
    }
}
