//! JSON messages exchanged with dashboard clients over the gateway.
//!
//! Every frame is one internally tagged object, for example:
//!
//! ```json
//! {"type":"Command","roomId":"room1","command":{"type":"SetDoorOpen","open":true}}
//! ```

use cureroom_protocol::{Command, RoomId};
use serde::{Deserialize, Serialize};

use crate::notifications::Notification;
use crate::{RoomSummary, RoomUpdate};

/// Requests a dashboard client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    ListRooms,
    /// Start receiving `RoomUpdate`s for a room; the current state is sent
    /// immediately.
    Subscribe { room_id: RoomId },
    /// Apply a command; the resulting `RoomUpdate` is the reply.
    Command { room_id: RoomId, command: Command },
    SaveBackup { room_id: RoomId },
    LoadBackup { room_id: RoomId },
    ExportCsv { room_id: RoomId },
    /// The notification log; with `activeOnly`, just the entries still
    /// needing attention.
    Notifications {
        room_id: RoomId,
        #[serde(default)]
        active_only: bool,
    },
    DismissAlert { room_id: RoomId, alert_id: String },
    /// Dismiss every active notification.
    DismissAllAlerts { room_id: RoomId },
    /// Empty the notification history.
    ClearNotifications { room_id: RoomId },
}

/// Messages the gateway sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomList { rooms: Vec<RoomSummary> },
    RoomUpdate(RoomUpdate),
    Csv { room_id: RoomId, csv: String },
    Notifications { room_id: RoomId, entries: Vec<Notification> },
    /// A request without a payload-bearing reply succeeded.
    Ack { room_id: RoomId, action: String },
    /// A request failed. Codes follow HTTP: 400 malformed, 404 unknown
    /// room or alert, 503 room unavailable, 500 anything else.
    Error { code: u16, message: String },
}

#[cfg(test)]
mod tests {
    use cureroom_protocol::{Codec, JsonCodec, Mode};

    use super::*;

    #[test]
    fn test_client_message_wire_shape() {
        let msg: ClientMessage = JsonCodec
            .decode(
                br#"{"type":"Command","roomId":"room1","command":{"type":"SetMode","mode":"automatic"}}"#,
            )
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Command {
                room_id: RoomId::from("room1"),
                command: Command::SetMode { mode: Mode::Automatic },
            }
        );

        let msg: ClientMessage = JsonCodec
            .decode(br#"{"type":"DismissAlert","roomId":"room2","alertId":"door-open"}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::DismissAlert { alert_id, .. } if alert_id == "door-open"));

        let msg: ClientMessage = JsonCodec.decode(br#"{"type":"ListRooms"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ListRooms);
    }

    #[test]
    fn test_notifications_default_to_full_log() {
        let msg: ClientMessage = JsonCodec
            .decode(br#"{"type":"Notifications","roomId":"room1"}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::Notifications { active_only: false, .. }));

        let msg: ClientMessage = JsonCodec
            .decode(br#"{"type":"Notifications","roomId":"room1","activeOnly":true}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::Notifications { active_only: true, .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> = JsonCodec.decode(br#"{"type":"Reboot"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_error_wire_shape() {
        let text = JsonCodec
            .encode_text(&ServerMessage::Error {
                code: 404,
                message: "room room9 not found".into(),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "Error");
        assert_eq!(value["code"], 404);
    }
}
