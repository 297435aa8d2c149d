//! Per-connection handler: decode client requests, route them to rooms,
//! and stream room updates back.
//!
//! The socket is split so subscription updates can be written while the
//! handler waits for the next client frame. Each subscription runs a small
//! forwarding task that feeds one shared outbound queue.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use cureroom_protocol::{Codec, RoomId};
use cureroom_store::SnapshotStore;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerState;
use crate::{CureroomError, RoomError, RoomHandle};

type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Aborts every forwarding task when the connection ends.
#[derive(Default)]
struct Subscriptions {
    tasks: HashMap<RoomId, JoinHandle<()>>,
}

impl Subscriptions {
    /// Whether `room_id` still has a running forwarder. A forwarder ends
    /// when its room closes; its entry is dropped here so the client can
    /// subscribe again.
    fn is_live(&mut self, room_id: &RoomId) -> bool {
        if self.tasks.get(room_id).is_some_and(JoinHandle::is_finished) {
            self.tasks.remove(room_id);
        }
        self.tasks.contains_key(room_id)
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

/// Handles a single connection from handshake to close.
pub(crate) async fn handle_connection<S: SnapshotStore>(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState<S>>,
) -> Result<(), CureroomError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    info!(%peer, "dashboard client connected");

    let (mut sink, mut frames) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut subscriptions = Subscriptions::default();

    loop {
        tokio::select! {
            frame = frames.next() => {
                let data = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().as_bytes().to_vec(),
                    Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
                    Some(Ok(Message::Close(_))) | None => {
                        info!(%peer, "dashboard client disconnected");
                        break;
                    }
                    // Ping/pong are answered by tungstenite.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(%peer, error = %e, "receive failed");
                        break;
                    }
                };

                let reply = match state.codec.decode::<ClientMessage>(&data) {
                    Ok(request) => handle_request(&state, request, &out_tx, &mut subscriptions).await,
                    Err(e) => {
                        debug!(%peer, error = %e, "undecodable client frame");
                        error_reply(400, format!("invalid message: {e}"))
                    }
                };
                let text = state.codec.encode_text(&reply)?;
                sink.send(Message::text(text)).await?;
            }
            Some(message) = out_rx.recv() => {
                let text = state.codec.encode_text(&message)?;
                sink.send(Message::text(text)).await?;
            }
        }
    }

    Ok(())
}

async fn handle_request<S: SnapshotStore>(
    state: &ServerState<S>,
    request: ClientMessage,
    out_tx: &Outbound,
    subscriptions: &mut Subscriptions,
) -> ServerMessage {
    let result = match request {
        ClientMessage::ListRooms => {
            let rooms = state.rooms.lock().await.list();
            Ok(ServerMessage::RoomList { rooms })
        }
        ClientMessage::Subscribe { room_id } => subscribe(state, room_id, out_tx, subscriptions).await,
        ClientMessage::Command { room_id, command } => match room(state, &room_id).await {
            Ok(handle) => handle.dispatch(command).await.map(ServerMessage::RoomUpdate),
            Err(e) => Err(e),
        },
        ClientMessage::SaveBackup { room_id } => match room(state, &room_id).await {
            Ok(handle) => handle.save_backup().await.map(|()| ack(room_id, "save_backup")),
            Err(e) => Err(e),
        },
        ClientMessage::LoadBackup { room_id } => match room(state, &room_id).await {
            Ok(handle) => handle.load_backup().await.map(ServerMessage::RoomUpdate),
            Err(e) => Err(e),
        },
        ClientMessage::ExportCsv { room_id } => match room(state, &room_id).await {
            Ok(handle) => handle
                .export_csv()
                .await
                .map(|csv| ServerMessage::Csv { room_id, csv }),
            Err(e) => Err(e),
        },
        ClientMessage::Notifications { room_id, active_only } => match room(state, &room_id).await {
            Ok(handle) => {
                let entries = if active_only {
                    handle.active_notifications().await
                } else {
                    handle.notifications().await
                };
                entries.map(|entries| ServerMessage::Notifications { room_id, entries })
            }
            Err(e) => Err(e),
        },
        ClientMessage::DismissAlert { room_id, alert_id } => match room(state, &room_id).await {
            Ok(handle) => match handle.dismiss_alert(alert_id.as_str()).await {
                Ok(true) => Ok(ack(room_id, "dismiss_alert")),
                Ok(false) => return error_reply(404, format!("alert {alert_id} not found")),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        ClientMessage::DismissAllAlerts { room_id } => match room(state, &room_id).await {
            Ok(handle) => handle.dismiss_all().await.map(|_| ack(room_id, "dismiss_all")),
            Err(e) => Err(e),
        },
        ClientMessage::ClearNotifications { room_id } => match room(state, &room_id).await {
            Ok(handle) => handle
                .clear_notifications()
                .await
                .map(|()| ack(room_id, "clear_notifications")),
            Err(e) => Err(e),
        },
    };

    result.unwrap_or_else(|e| error_reply(error_code(&e), e.to_string()))
}

async fn subscribe<S: SnapshotStore>(
    state: &ServerState<S>,
    room_id: RoomId,
    out_tx: &Outbound,
    subscriptions: &mut Subscriptions,
) -> Result<ServerMessage, RoomError> {
    let handle = room(state, &room_id).await?;
    if !subscriptions.is_live(&room_id) {
        let mut updates = handle.subscribe().await?;
        let out_tx = out_tx.clone();
        let task = tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                if out_tx.send(ServerMessage::RoomUpdate(update)).is_err() {
                    break;
                }
            }
        });
        subscriptions.tasks.insert(room_id.clone(), task);
        debug!(%room_id, "client subscribed");
    }
    Ok(ack(room_id, "subscribe"))
}

/// Looks up a room without holding the manager lock across the request.
async fn room<S: SnapshotStore>(state: &ServerState<S>, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
    state.rooms.lock().await.room(room_id)
}

fn ack(room_id: RoomId, action: &str) -> ServerMessage {
    ServerMessage::Ack {
        room_id,
        action: action.to_string(),
    }
}

fn error_reply(code: u16, message: String) -> ServerMessage {
    ServerMessage::Error { code, message }
}

fn error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) | RoomError::NoBackup(_) => 404,
        RoomError::AlreadyExists(_) => 409,
        RoomError::Unavailable(_) => 503,
        RoomError::Protocol(_) | RoomError::InvalidId(..) => 400,
        RoomError::Store(_) | RoomError::Telemetry(_) => 500,
    }
}
