//! Per-room notification history.
//!
//! Every alert id is recorded the first time it is seen, together with a
//! timestamp, and stays in the log until cleared. Operators dismiss
//! entries; a dismissed entry is never reported as active again, even if
//! the alert returns.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use cureroom_protocol::{Alert, RoomId, Severity};
use cureroom_supervisor::RoomEvent;
use serde::{Deserialize, Serialize};

/// Entries kept per room before the oldest are dropped.
pub const NOTIFICATION_LOG_CAPACITY: usize = 500;

/// Id prefix for drying-complete entries. Each completion gets its own
/// entry, suffixed with the completion time.
pub const DRYING_COMPLETE_PREFIX: &str = "drying-complete";

/// One logged notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub room_id: RoomId,
    pub room_name: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub dismissed: bool,
}

/// Ordered, deduplicated alert history for one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records alerts not logged before, plus an info entry for each
    /// `DryingComplete` event. Returns whether anything was added.
    pub fn observe(
        &mut self,
        room_id: &RoomId,
        room_name: &str,
        alerts: &[Alert],
        events: &[RoomEvent],
        now: DateTime<Utc>,
    ) -> bool {
        let known: HashSet<&str> = self.entries.iter().map(|n| n.id.as_str()).collect();
        let fresh: Vec<Notification> = alerts
            .iter()
            .filter(|alert| !known.contains(alert.id.as_str()))
            .map(|alert| Notification {
                id: alert.id.clone(),
                room_id: room_id.clone(),
                room_name: room_name.to_owned(),
                severity: alert.severity,
                message: format!("{room_name}: {}", alert.message),
                timestamp: now,
                dismissed: false,
            })
            .collect();
        let mut added = fresh.len();
        self.entries.extend(fresh);

        if events.contains(&RoomEvent::DryingComplete) {
            self.entries.push(Notification {
                id: format!("{DRYING_COMPLETE_PREFIX}-{}", now.timestamp_millis()),
                room_id: room_id.clone(),
                room_name: room_name.to_owned(),
                severity: Severity::Info,
                message: format!("{room_name}: Drying cycle complete"),
                timestamp: now,
                dismissed: false,
            });
            added += 1;
        }

        if self.entries.len() > NOTIFICATION_LOG_CAPACITY {
            let excess = self.entries.len() - NOTIFICATION_LOG_CAPACITY;
            self.entries.drain(..excess);
        }
        added > 0
    }

    /// Marks `id` dismissed. Returns `false` if no such entry exists.
    pub fn dismiss(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Undismissed entries that still matter: info entries, and alert
    /// entries whose alert is in `current`.
    pub fn active<'a>(&'a self, current: &'a [Alert]) -> impl Iterator<Item = &'a Notification> {
        self.entries.iter().filter(move |n| {
            !n.dismissed
                && (n.severity == Severity::Info || current.iter().any(|a| a.id == n.id))
        })
    }

    /// Dismisses every entry [`active`](Self::active) would report.
    /// Returns how many were dismissed.
    pub fn dismiss_active(&mut self, current: &[Alert]) -> usize {
        let mut dismissed = 0;
        for entry in &mut self.entries {
            let live = entry.severity == Severity::Info || current.iter().any(|a| a.id == entry.id);
            if !entry.dismissed && live {
                entry.dismissed = true;
                dismissed += 1;
            }
        }
        dismissed
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Forgets the whole history. Alerts still present are logged afresh
    /// the next time they are observed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn alert(id: &str, severity: Severity) -> Alert {
        Alert {
            id: id.to_string(),
            severity,
            message: id.to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_records_each_alert_once() {
        let room = RoomId::from("room1");
        let mut log = NotificationLog::new();
        let door = alert("door-open", Severity::Warning);

        assert!(log.observe(&room, "Drying Room 1", &[door.clone()], &[], t0()));
        assert!(!log.observe(&room, "Drying Room 1", &[door.clone()], &[], t0()));
        // Alert clears and comes back: still a single entry.
        log.observe(&room, "Drying Room 1", &[], &[], t0());
        log.observe(&room, "Drying Room 1", &[door], &[], t0() + Duration::minutes(5));

        assert_eq!(log.len(), 1);
        let entry = &log.entries()[0];
        assert_eq!(entry.timestamp, t0());
        assert_eq!(entry.message, "Drying Room 1: door-open");
        assert_eq!(entry.room_id, room);
    }

    #[test]
    fn test_drying_complete_adds_info_entry() {
        let room = RoomId::from("room2");
        let mut log = NotificationLog::new();
        log.observe(&room, "Drying Room 2", &[], &[RoomEvent::DryingComplete], t0());
        log.observe(
            &room,
            "Drying Room 2",
            &[],
            &[RoomEvent::DryingComplete],
            t0() + Duration::hours(30),
        );

        assert_eq!(log.len(), 2);
        assert!(log.entries().iter().all(|n| n.severity == Severity::Info));
        assert!(log.entries()[0].id.starts_with(DRYING_COMPLETE_PREFIX));
        assert_ne!(log.entries()[0].id, log.entries()[1].id);
    }

    #[test]
    fn test_active_and_dismiss() {
        let room = RoomId::from("room1");
        let mut log = NotificationLog::new();
        let door = alert("door-open", Severity::Warning);
        let estop = alert("emergency-stop", Severity::Error);
        log.observe(&room, "R1", &[door.clone(), estop.clone()], &[], t0());

        let current = [door.clone()];
        let active: Vec<_> = log.active(&current).map(|n| n.id.as_str()).collect();
        assert_eq!(active, ["door-open"]);

        assert!(log.dismiss("door-open"));
        assert!(!log.dismiss("no-such-alert"));
        assert_eq!(log.active(&current).count(), 0);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_dismiss_active_leaves_history_intact() {
        let room = RoomId::from("room1");
        let mut log = NotificationLog::new();
        let door = alert("door-open", Severity::Warning);
        let estop = alert("emergency-stop", Severity::Error);
        log.observe(&room, "R1", &[door.clone(), estop], &[RoomEvent::DryingComplete], t0());

        // The emergency stop has cleared; only the door and the info entry are live.
        assert_eq!(log.dismiss_active(&[door.clone()]), 2);
        assert_eq!(log.active(&[door.clone()]).count(), 0);
        assert_eq!(log.len(), 3);
        assert!(!log.entries()[1].dismissed);
        assert_eq!(log.dismiss_active(&[door]), 0);
    }

    #[test]
    fn test_clear_forgets_seen_alerts() {
        let room = RoomId::from("room1");
        let mut log = NotificationLog::new();
        let door = alert("door-open", Severity::Warning);
        log.observe(&room, "R1", &[door.clone()], &[], t0());
        log.clear();
        assert!(log.is_empty());
        assert!(log.observe(&room, "R1", &[door], &[], t0()));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let room = RoomId::from("room1");
        let mut log = NotificationLog::new();
        for i in 0..NOTIFICATION_LOG_CAPACITY + 10 {
            let a = alert(&format!("a{i}"), Severity::Warning);
            log.observe(&room, "R1", &[a], &[], t0());
        }
        assert_eq!(log.len(), NOTIFICATION_LOG_CAPACITY);
        assert_eq!(log.entries()[0].id, "a10");
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut log = NotificationLog::new();
        log.observe(&RoomId::from("room1"), "R1", &[alert("door-open", Severity::Warning)], &[], t0());
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["roomId"], "room1");
        let back: NotificationLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);
    }
}
