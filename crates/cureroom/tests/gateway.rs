//! End-to-end tests for the dashboard WebSocket gateway.

use std::time::Duration;

use cureroom::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a gateway with the three default rooms on a random port.
async fn start_server() -> String {
    let config = DashboardConfig {
        runtime: RuntimeConfig {
            sensor_period: None,
            ..RuntimeConfig::default()
        },
        ..DashboardConfig::default()
    };
    let server = DashboardServer::<MemoryStore>::builder()
        .config(config)
        .bind("127.0.0.1:0")
        .build(MemoryStore::new())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send should succeed");
}

/// Receives the next text frame as JSON.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("reply should arrive")
            .expect("stream should be open")
            .expect("frame should be valid");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("reply should be JSON");
        }
    }
}

async fn request(ws: &mut ClientWs, value: Value) -> Value {
    send(ws, value).await;
    recv(ws).await
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_rooms() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let reply = request(&mut ws, json!({ "type": "ListRooms" })).await;
    assert_eq!(reply["type"], "RoomList");
    let rooms = reply["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 3);
    assert_eq!(rooms[0]["roomId"], "room1");
    assert_eq!(rooms[2]["name"], "Drying Room 3");
}

#[tokio::test]
async fn test_command_returns_room_update() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let reply = request(
        &mut ws,
        json!({
            "type": "Command",
            "roomId": "room2",
            "command": { "type": "SetMode", "mode": "automatic" }
        }),
    )
    .await;
    assert_eq!(reply["type"], "RoomUpdate");
    assert_eq!(reply["roomId"], "room2");
    assert_eq!(reply["state"]["mode"], "automatic");
    assert_eq!(reply["state"]["timer"]["running"], true);
    assert_eq!(reply["status"], "Normal");

    let reply = request(
        &mut ws,
        json!({
            "type": "Command",
            "roomId": "room2",
            "command": { "type": "SetEmergencyStop", "engaged": true }
        }),
    )
    .await;
    assert_eq!(reply["status"], "EmergencyStopped");
    assert_eq!(reply["state"]["mode"], "manual");
    assert_eq!(reply["state"]["devices"]["airDryer"], false);
    assert!(
        reply["alerts"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["id"] == "emergency-stop")
    );
}

#[tokio::test]
async fn test_errors_keep_connection_open() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let reply = request(
        &mut ws,
        json!({ "type": "Command", "roomId": "room9", "command": { "type": "ResetTimer" } }),
    )
    .await;
    assert_eq!(reply["type"], "Error");
    assert_eq!(reply["code"], 404);

    ws.send(Message::text("this is not json"))
        .await
        .unwrap();
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "Error");
    assert_eq!(reply["code"], 400);

    let reply = request(&mut ws, json!({ "type": "Reboot" })).await;
    assert_eq!(reply["code"], 400);

    let reply = request(&mut ws, json!({ "type": "LoadBackup", "roomId": "room1" })).await;
    assert_eq!(reply["code"], 404);

    let reply = request(&mut ws, json!({ "type": "ListRooms" })).await;
    assert_eq!(reply["type"], "RoomList");
}

#[tokio::test]
async fn test_subscription_receives_other_clients_changes() {
    let addr = start_server().await;
    let mut watcher = connect(&addr).await;
    let mut operator = connect(&addr).await;

    let ack = request(&mut watcher, json!({ "type": "Subscribe", "roomId": "room1" })).await;
    assert_eq!(ack["type"], "Ack");
    assert_eq!(ack["action"], "subscribe");

    let initial = recv(&mut watcher).await;
    assert_eq!(initial["type"], "RoomUpdate");
    assert_eq!(initial["state"]["doorOpen"], false);

    let reply = request(
        &mut operator,
        json!({
            "type": "Command",
            "roomId": "room1",
            "command": { "type": "SetDoorOpen", "open": true }
        }),
    )
    .await;
    assert_eq!(reply["status"], "DoorOpen");

    let pushed = recv(&mut watcher).await;
    assert_eq!(pushed["type"], "RoomUpdate");
    assert_eq!(pushed["state"]["doorOpen"], true);
    assert_eq!(pushed["events"][0]["event"], "DoorOpened");
}

#[tokio::test]
async fn test_backup_csv_and_notifications() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let reply = request(&mut ws, json!({ "type": "SaveBackup", "roomId": "room3" })).await;
    assert_eq!(reply["type"], "Ack");

    request(
        &mut ws,
        json!({
            "type": "Command",
            "roomId": "room3",
            "command": { "type": "SetTargetTemperature", "value": 95 }
        }),
    )
    .await;
    let restored = request(&mut ws, json!({ "type": "LoadBackup", "roomId": "room3" })).await;
    assert_eq!(restored["type"], "RoomUpdate");
    assert_eq!(restored["state"]["targets"]["temperatureC"], 60);

    let csv = request(&mut ws, json!({ "type": "ExportCsv", "roomId": "room3" })).await;
    assert_eq!(csv["type"], "Csv");
    assert_eq!(
        csv["csv"],
        "Timestamp,Temperature1,Temperature2,Temperature3,Temperature4,Humidity1,Humidity2\n"
    );

    request(
        &mut ws,
        json!({
            "type": "Command",
            "roomId": "room3",
            "command": { "type": "SetDoorOpen", "open": true }
        }),
    )
    .await;
    let log = request(&mut ws, json!({ "type": "Notifications", "roomId": "room3" })).await;
    assert_eq!(log["type"], "Notifications");
    assert_eq!(log["entries"][0]["id"], "door-open");
    assert_eq!(log["entries"][0]["roomName"], "Drying Room 3");

    let reply = request(
        &mut ws,
        json!({ "type": "DismissAlert", "roomId": "room3", "alertId": "door-open" }),
    )
    .await;
    assert_eq!(reply["type"], "Ack");

    let reply = request(
        &mut ws,
        json!({ "type": "DismissAlert", "roomId": "room3", "alertId": "missing" }),
    )
    .await;
    assert_eq!(reply["code"], 404);
}

#[tokio::test]
async fn test_out_of_range_numbers_are_clamped_not_rejected() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let frames = [
        (r#"{"type":"SetTargetTemperature","value":1e20}"#, "temperatureC", 100),
        (r#"{"type":"SetTargetTemperature","value":65.5}"#, "temperatureC", 66),
        (r#"{"type":"SetTargetHumidity","value":99999999999999999999}"#, "humidityPct", 90),
        (r#"{"type":"SetTargetHumidity","value":-1e30}"#, "humidityPct", 10),
        (r#"{"type":"SetDryingDuration","minutes":1e300}"#, "dryingDurationMinutes", 4320),
    ];
    for (command, field, expected) in frames {
        let frame = format!(r#"{{"type":"Command","roomId":"room1","command":{command}}}"#);
        ws.send(Message::text(frame)).await.unwrap();
        let reply = recv(&mut ws).await;
        assert_eq!(reply["type"], "RoomUpdate", "{command}");
        assert_eq!(reply["state"]["targets"][field], expected, "{command}");
    }
}

#[tokio::test]
async fn test_device_index_out_of_range_is_a_no_op() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let all_off = json!({
        "heaters": [false, false, false, false],
        "airDryer": false,
        "fans": [false, false]
    });
    for command in [
        json!({ "type": "ToggleHeater", "index": -1 }),
        json!({ "type": "ToggleFan", "index": 2 }),
        json!({ "type": "ToggleHeater", "index": 1.0e19 }),
    ] {
        let reply = request(
            &mut ws,
            json!({ "type": "Command", "roomId": "room2", "command": command }),
        )
        .await;
        assert_eq!(reply["type"], "RoomUpdate", "{command}");
        assert_eq!(reply["state"]["devices"], all_off, "{command}");
        assert_eq!(reply["events"], json!([]), "{command}");
    }
}

#[tokio::test]
async fn test_active_notifications_dismiss_all_and_clear() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    request(
        &mut ws,
        json!({
            "type": "Command",
            "roomId": "room1",
            "command": { "type": "SetDoorOpen", "open": true }
        }),
    )
    .await;
    let active = request(
        &mut ws,
        json!({ "type": "Notifications", "roomId": "room1", "activeOnly": true }),
    )
    .await;
    assert_eq!(active["type"], "Notifications");
    assert_eq!(active["entries"].as_array().unwrap().len(), 1);
    assert_eq!(active["entries"][0]["id"], "door-open");

    let reply = request(&mut ws, json!({ "type": "DismissAllAlerts", "roomId": "room1" })).await;
    assert_eq!(reply["type"], "Ack");
    assert_eq!(reply["action"], "dismiss_all");

    let active = request(
        &mut ws,
        json!({ "type": "Notifications", "roomId": "room1", "activeOnly": true }),
    )
    .await;
    assert_eq!(active["entries"], json!([]));
    let log = request(&mut ws, json!({ "type": "Notifications", "roomId": "room1" })).await;
    assert_eq!(log["entries"][0]["dismissed"], true);

    let reply = request(&mut ws, json!({ "type": "ClearNotifications", "roomId": "room1" })).await;
    assert_eq!(reply["action"], "clear_notifications");
    let log = request(&mut ws, json!({ "type": "Notifications", "roomId": "room1" })).await;
    assert_eq!(log["entries"], json!([]));

    let reply = request(&mut ws, json!({ "type": "DismissAllAlerts", "roomId": "room9" })).await;
    assert_eq!(reply["code"], 404);
}
