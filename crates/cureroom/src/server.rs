//! `DashboardServer` builder and accept loop.
//!
//! The server opens every configured room, then accepts WebSocket
//! connections from dashboard clients and hands each one to its own task.

use std::net::SocketAddr;
use std::sync::Arc;

use cureroom_protocol::{JsonCodec, RoomId};
use cureroom_store::SnapshotStore;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{CureroomError, DashboardConfig, RoomError, RoomHandle, RoomManager};

/// Shared state passed to each connection task.
pub(crate) struct ServerState<S: SnapshotStore> {
    pub(crate) rooms: Mutex<RoomManager<S>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for a [`DashboardServer`].
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), cureroom::CureroomError> {
/// use cureroom::prelude::*;
///
/// let server = DashboardServer::<MemoryStore>::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DashboardServerBuilder {
    config: DashboardConfig,
    bind_override: Option<String>,
}

impl DashboardServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the listen address, taking precedence over the configuration.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_override = Some(addr.to_string());
        self
    }

    /// Binds the listener and opens every configured room against `store`.
    pub async fn build<S: SnapshotStore>(self, store: S) -> Result<DashboardServer<S>, CureroomError> {
        let addr = self.bind_override.unwrap_or(self.config.bind_addr);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "dashboard gateway listening");

        let mut rooms = RoomManager::new(store, self.config.runtime);
        for spec in self.config.rooms {
            rooms.open_room(spec).await?;
        }

        Ok(DashboardServer {
            listener,
            state: Arc::new(ServerState {
                rooms: Mutex::new(rooms),
                codec: JsonCodec,
            }),
        })
    }
}

/// A bound gateway with its rooms running.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DashboardServer<S: SnapshotStore> {
    listener: TcpListener,
    state: Arc<ServerState<S>>,
}

impl<S: SnapshotStore> DashboardServer<S> {
    pub fn builder() -> DashboardServerBuilder {
        DashboardServerBuilder::new()
    }

    /// Returns the local address the gateway is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle of an open room.
    pub async fn room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.state.rooms.lock().await.room(room_id)
    }

    /// Handles of every open room, in opening order.
    pub async fn rooms(&self) -> Vec<RoomHandle> {
        self.state.rooms.lock().await.room_handles()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), CureroomError> {
        tracing::info!("dashboard gateway running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, state).await {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Shuts every room down. The listener is dropped with the server.
    pub async fn shutdown(self) {
        self.state.rooms.lock().await.close_all().await;
    }
}
