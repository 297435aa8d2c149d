//! Room manager: opens, tracks, and routes requests to rooms.

use std::collections::HashMap;

use cureroom_protocol::RoomId;
use cureroom_store::{SnapshotStore, keys};
use cureroom_telemetry::{SensorSource, SimulatedSensors};
use serde::{Deserialize, Serialize};

use crate::room::spawn_room;
use crate::{RoomError, RoomHandle, RoomSpec, RuntimeConfig};

/// A room as listed to dashboard clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub name: String,
}

/// Owns the handles of every open room.
///
/// Rooms are independent actors; the manager only maps ids to handles
/// and remembers the order rooms were opened in.
pub struct RoomManager<S: SnapshotStore> {
    store: S,
    config: RuntimeConfig,
    rooms: HashMap<RoomId, RoomHandle>,
    order: Vec<RoomId>,
}

impl<S: SnapshotStore> RoomManager<S> {
    pub fn new(store: S, config: RuntimeConfig) -> Self {
        Self {
            store,
            config,
            rooms: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Opens a room fed by simulated sensors.
    ///
    /// When sensor polling is disabled in the runtime config the room gets
    /// no source at all and readings arrive only as commands.
    pub async fn open_room(&mut self, spec: RoomSpec) -> Result<RoomHandle, RoomError> {
        let sensors = self
            .config
            .sensor_period
            .map(|_| Box::new(SimulatedSensors::new(&spec.layout)) as Box<dyn SensorSource>);
        self.open(spec, sensors).await
    }

    /// Opens a room that polls `source` on each sampling tick.
    pub async fn open_room_with_source(
        &mut self,
        spec: RoomSpec,
        source: impl SensorSource,
    ) -> Result<RoomHandle, RoomError> {
        self.open(spec, Some(Box::new(source))).await
    }

    async fn open(
        &mut self,
        spec: RoomSpec,
        sensors: Option<Box<dyn SensorSource>>,
    ) -> Result<RoomHandle, RoomError> {
        if self.rooms.contains_key(&spec.id) {
            return Err(RoomError::AlreadyExists(spec.id));
        }
        if let Err(e) = keys::check_room_id(spec.id.as_str()) {
            return Err(RoomError::InvalidId(spec.id, e));
        }

        let room_id = spec.id.clone();
        let handle = spawn_room(spec, self.store.clone(), sensors, &self.config).await;
        self.rooms.insert(room_id.clone(), handle.clone());
        self.order.push(room_id.clone());
        tracing::info!(%room_id, rooms = self.rooms.len(), "room opened");
        Ok(handle)
    }

    /// Returns the handle of `room_id`.
    pub fn room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Handles of every open room, in opening order.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id).cloned())
            .collect()
    }

    /// Ids and display names of every open room, in opening order.
    pub fn list(&self) -> Vec<RoomSummary> {
        self.room_handles()
            .into_iter()
            .map(|handle| RoomSummary {
                room_id: handle.room_id().clone(),
                name: handle.name().to_owned(),
            })
            .collect()
    }

    /// Shuts a room down and forgets it.
    pub async fn close_room(&mut self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        self.order.retain(|id| id != room_id);

        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room closed");
        Ok(())
    }

    /// Shuts every room down.
    pub async fn close_all(&mut self) {
        for room_id in std::mem::take(&mut self.order) {
            if let Some(handle) = self.rooms.remove(&room_id) {
                let _ = handle.shutdown().await;
            }
        }
        tracing::info!("all rooms closed");
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
