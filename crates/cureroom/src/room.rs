//! Room actor: an isolated Tokio task that owns one drying room.
//!
//! The actor is the only thing that touches its [`RoomSupervisor`]. It
//! multiplexes three inputs in a single `select!` loop: commands from
//! [`RoomHandle`]s, countdown ticks (paused while the timer is stopped),
//! and sensor sampling ticks. After every transition it persists what is
//! durable, logs new notifications, and pushes a [`RoomUpdate`] to every
//! subscriber.

use chrono::{DateTime, Utc};
use cureroom_protocol::{Alert, Codec, Command, JsonCodec, Mode, RoomId};
use cureroom_store::{SnapshotStore, keys};
use cureroom_supervisor::{
    RoomEvent, RoomSnapshot, RoomState, RoomStatus, RoomSupervisor, Transition,
};
use cureroom_telemetry::{HistoryRow, SensorHistory, SensorSource};
use cureroom_tick::{TickConfig, TickPolicy, TickScheduler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::notifications::{Notification, NotificationLog};
use crate::{RoomError, RoomSpec, RuntimeConfig};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What subscribers receive after each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    pub room_id: RoomId,
    pub state: RoomState,
    pub alerts: Vec<Alert>,
    pub status: RoomStatus,
    pub events: Vec<RoomEvent>,
    /// Remaining fraction of the drying cycle, 0.0 to 1.0.
    pub progress: f64,
    /// Remaining time as `HH:MM:SS`.
    pub remaining_hms: String,
    /// When the cycle will finish, if the countdown is running.
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl RoomUpdate {
    fn new(room_id: RoomId, state: RoomState, events: Vec<RoomEvent>, now: DateTime<Utc>) -> Self {
        Self {
            room_id,
            alerts: state.alerts.clone(),
            status: state.status(),
            events,
            progress: state.timer.progress(),
            remaining_hms: state.timer.format_hms(),
            estimated_completion: state.timer.estimated_completion(now),
            state,
        }
    }
}

/// Room metadata for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub mode: Mode,
    pub status: RoomStatus,
    pub alert_count: usize,
    pub timer_running: bool,
    pub subscribers: usize,
}

/// Receiving end of a room subscription.
pub type UpdateReceiver = mpsc::UnboundedReceiver<RoomUpdate>;

type UpdateSender = mpsc::UnboundedSender<RoomUpdate>;

/// Requests a [`RoomHandle`] sends to its actor.
enum RoomCommand {
    Dispatch {
        command: Command,
        reply: oneshot::Sender<RoomUpdate>,
    },
    Subscribe {
        sender: UpdateSender,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    SaveBackup {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    LoadBackup {
        reply: oneshot::Sender<Result<RoomUpdate, RoomError>>,
    },
    ExportCsv {
        reply: oneshot::Sender<Result<String, RoomError>>,
    },
    SeedHistory {
        rows: Vec<HistoryRow>,
        reply: oneshot::Sender<usize>,
    },
    Notifications {
        active_only: bool,
        reply: oneshot::Sender<Vec<Notification>>,
    },
    DismissAll {
        reply: oneshot::Sender<usize>,
    },
    ClearNotifications {
        reply: oneshot::Sender<()>,
    },
    DismissAlert {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dispatch { command, .. } => command.name(),
            Self::Subscribe { .. } => "subscribe",
            Self::Snapshot { .. } => "snapshot",
            Self::SaveBackup { .. } => "save_backup",
            Self::LoadBackup { .. } => "load_backup",
            Self::ExportCsv { .. } => "export_csv",
            Self::SeedHistory { .. } => "seed_history",
            Self::Notifications { .. } => "notifications",
            Self::DismissAll { .. } => "dismiss_all",
            Self::ClearNotifications { .. } => "clear_notifications",
            Self::DismissAlert { .. } => "dismiss_alert",
            Self::Info { .. } => "info",
            Self::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor.
///
/// Cheap to clone: it wraps the actor's command sender. Every method
/// fails with [`RoomError::Unavailable`] once the actor has stopped.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies `command` and returns the resulting update.
    pub async fn dispatch(&self, command: Command) -> Result<RoomUpdate, RoomError> {
        self.request(|reply| RoomCommand::Dispatch { command, reply })
            .await
    }

    /// Subscribes to updates. The current state arrives first.
    pub async fn subscribe(&self) -> Result<UpdateReceiver, RoomError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.request(|reply| RoomCommand::Subscribe { sender, reply })
            .await?;
        Ok(receiver)
    }

    /// The durable part of the room's state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Copies the current snapshot into the room's backup slot.
    pub async fn save_backup(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SaveBackup { reply })
            .await?
    }

    /// Restores the backup snapshot, which also becomes the latest one.
    pub async fn load_backup(&self) -> Result<RoomUpdate, RoomError> {
        self.request(|reply| RoomCommand::LoadBackup { reply })
            .await?
    }

    /// The sensor history as CSV.
    pub async fn export_csv(&self) -> Result<String, RoomError> {
        self.request(|reply| RoomCommand::ExportCsv { reply }).await?
    }

    /// Appends pre-recorded rows to the sensor history. Returns the new
    /// history length.
    pub async fn seed_history(&self, rows: Vec<HistoryRow>) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::SeedHistory { rows, reply })
            .await
    }

    /// The room's full notification log, oldest first.
    pub async fn notifications(&self) -> Result<Vec<Notification>, RoomError> {
        self.request(|reply| RoomCommand::Notifications { active_only: false, reply })
            .await
    }

    /// Undismissed notifications whose alert is still raised, plus
    /// undismissed drying-complete entries.
    pub async fn active_notifications(&self) -> Result<Vec<Notification>, RoomError> {
        self.request(|reply| RoomCommand::Notifications { active_only: true, reply })
            .await
    }

    /// Dismisses every active notification. Returns how many changed.
    pub async fn dismiss_all(&self) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::DismissAll { reply }).await
    }

    /// Empties the notification log.
    pub async fn clear_notifications(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::ClearNotifications { reply })
            .await
    }

    /// Dismisses a logged notification. Returns `false` if the id is
    /// unknown.
    pub async fn dismiss_alert(&self, id: impl Into<String>) -> Result<bool, RoomError> {
        let id = id.into();
        self.request(|reply| RoomCommand::DismissAlert { id, reply })
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct RoomActor<S: SnapshotStore> {
    room_id: RoomId,
    name: String,
    supervisor: RoomSupervisor,
    store: S,
    codec: JsonCodec,
    sensors: Option<Box<dyn SensorSource>>,
    history: SensorHistory,
    notifications: NotificationLog,
    subscribers: Vec<UpdateSender>,
    countdown: TickScheduler,
    sampling: TickScheduler,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<S: SnapshotStore> RoomActor<S> {
    async fn run(mut self) {
        info!(room_id = %self.room_id, name = %self.name, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd).await,
                },
                tick = self.countdown.wait_for_tick() => {
                    self.on_countdown(tick.missed).await;
                }
                _ = self.sampling.wait_for_tick() => {
                    self.on_sample().await;
                }
            }
        }

        info!(room_id = %self.room_id, "room actor stopped");
    }

    async fn handle(&mut self, cmd: RoomCommand) {
        debug!(room_id = %self.room_id, request = ?cmd, "room request");
        match cmd {
            RoomCommand::Dispatch { command, reply } => {
                let transition = self.supervisor.apply(command);
                let update = self.commit(transition).await;
                let _ = reply.send(update);
            }
            RoomCommand::Subscribe { sender, reply } => {
                let state = self.supervisor.state().clone();
                let update = RoomUpdate::new(self.room_id.clone(), state, Vec::new(), Utc::now());
                if sender.send(update).is_ok() {
                    self.subscribers.push(sender);
                }
                let _ = reply.send(());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.supervisor.snapshot());
            }
            RoomCommand::SaveBackup { reply } => {
                let _ = reply.send(self.save_backup().await);
            }
            RoomCommand::LoadBackup { reply } => {
                let _ = reply.send(self.load_backup().await);
            }
            RoomCommand::ExportCsv { reply } => {
                let _ = reply.send(self.history.export_csv().map_err(RoomError::from));
            }
            RoomCommand::SeedHistory { rows, reply } => {
                self.history.extend(rows);
                let _ = reply.send(self.history.len());
            }
            RoomCommand::Notifications { active_only, reply } => {
                let entries = if active_only {
                    self.notifications
                        .active(self.supervisor.alerts())
                        .cloned()
                        .collect()
                } else {
                    self.notifications.entries().to_vec()
                };
                let _ = reply.send(entries);
            }
            RoomCommand::DismissAll { reply } => {
                let dismissed = self.notifications.dismiss_active(self.supervisor.alerts());
                if dismissed > 0 {
                    self.persist_notifications().await;
                }
                let _ = reply.send(dismissed);
            }
            RoomCommand::ClearNotifications { reply } => {
                self.notifications.clear();
                self.persist_notifications().await;
                info!(room_id = %self.room_id, "notification history cleared");
                let _ = reply.send(());
            }
            RoomCommand::DismissAlert { id, reply } => {
                let dismissed = self.notifications.dismiss(&id);
                if dismissed {
                    self.persist_notifications().await;
                }
                let _ = reply.send(dismissed);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Applies one `TimerTick` per elapsed period, stopping early if the
    /// countdown finishes.
    async fn on_countdown(&mut self, missed: u64) {
        let mut transition = self.supervisor.apply(Command::TimerTick);
        for _ in 0..missed {
            if !transition.state.timer.running {
                break;
            }
            let mut next = self.supervisor.apply(Command::TimerTick);
            transition.events.append(&mut next.events);
            next.events = std::mem::take(&mut transition.events);
            transition = next;
        }
        self.commit(transition).await;
    }

    async fn on_sample(&mut self) {
        let Some(source) = self.sensors.as_mut() else {
            return;
        };
        let report = source.poll();

        let mut last = None;
        if report.online != self.supervisor.state().connection_online {
            last = Some(self.supervisor.apply(Command::SetConnectionStatus {
                online: report.online,
            }));
        }
        for sample in report.samples {
            last = Some(self.supervisor.apply(Command::UpdateSensor { sample }));
        }
        if report.online {
            self.history.record(Utc::now(), &self.supervisor.state().sensors);
        }
        if let Some(transition) = last {
            self.commit(transition).await;
        }
    }

    /// Follows up on a transition: countdown cadence, persistence,
    /// notifications, and fan-out.
    async fn commit(&mut self, transition: Transition) -> RoomUpdate {
        let Transition {
            state,
            events,
            durable,
            ..
        } = transition;
        let now = Utc::now();

        self.countdown.follow(state.timer.running);
        if events.contains(&RoomEvent::DryingComplete) {
            info!(room_id = %self.room_id, "drying cycle complete, alarm raised");
        }

        if durable {
            self.persist_latest().await;
        }
        if self
            .notifications
            .observe(&self.room_id, &self.name, &state.alerts, &events, now)
        {
            self.persist_notifications().await;
        }

        let update = RoomUpdate::new(self.room_id.clone(), state, events, now);
        self.subscribers
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
        update
    }

    async fn save_backup(&mut self) -> Result<(), RoomError> {
        let key = keys::backup(self.room_id.as_str());
        put_encoded(&self.store, &self.codec, &key, &self.supervisor.snapshot()).await?;
        info!(room_id = %self.room_id, "backup saved");
        Ok(())
    }

    async fn load_backup(&mut self) -> Result<RoomUpdate, RoomError> {
        let key = keys::backup(self.room_id.as_str());
        let bytes = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| RoomError::NoBackup(self.room_id.clone()))?;
        let snapshot: RoomSnapshot = self.codec.decode(&bytes)?;

        let transition = self.supervisor.restore(snapshot);
        info!(room_id = %self.room_id, "backup restored");
        Ok(self.commit(transition).await)
    }

    async fn persist_latest(&mut self) {
        let key = keys::latest(self.room_id.as_str());
        let snapshot = self.supervisor.snapshot();
        if let Err(e) = put_encoded(&self.store, &self.codec, &key, &snapshot).await {
            warn!(room_id = %self.room_id, error = %e, "failed to save snapshot");
        }
    }

    async fn persist_notifications(&mut self) {
        let key = keys::alert_history(self.room_id.as_str());
        if let Err(e) = put_encoded(&self.store, &self.codec, &key, &self.notifications).await {
            warn!(room_id = %self.room_id, error = %e, "failed to save notification log");
        }
    }

    fn info(&self) -> RoomInfo {
        let state = self.supervisor.state();
        RoomInfo {
            room_id: self.room_id.clone(),
            name: self.name.clone(),
            mode: state.mode,
            status: state.status(),
            alert_count: state.alerts.len(),
            timer_running: state.timer.running,
            subscribers: self.subscribers.len(),
        }
    }
}

/// Loads and decodes `key`, treating a missing, unreadable, or corrupt
/// entry as absent.
async fn load_or_default<S, T>(store: &S, codec: &JsonCodec, room_id: &RoomId, key: &str) -> Option<T>
where
    S: SnapshotStore,
    T: DeserializeOwned,
{
    match store.get(key).await {
        Ok(Some(bytes)) => match codec.decode(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%room_id, key, error = %e, "stored value is corrupt, using defaults");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(%room_id, key, error = %e, "failed to read stored value, using defaults");
            None
        }
    }
}

async fn put_encoded<S, T>(store: &S, codec: &JsonCodec, key: &str, value: &T) -> Result<(), RoomError>
where
    S: SnapshotStore,
    T: Serialize + Sync,
{
    let bytes = codec.encode(value)?;
    store.put(key, bytes).await?;
    Ok(())
}

/// Restores a room from `store` and spawns its actor.
///
/// `channel_size` bounds the command channel; senders wait when it is
/// full.
pub(crate) async fn spawn_room<S: SnapshotStore>(
    spec: RoomSpec,
    store: S,
    sensors: Option<Box<dyn SensorSource>>,
    config: &RuntimeConfig,
) -> RoomHandle {
    let codec = JsonCodec;
    let room_id = spec.id.clone();

    let mut supervisor = RoomSupervisor::with_layout(room_id.clone(), &spec.layout);
    let latest = keys::latest(room_id.as_str());
    if let Some(snapshot) = load_or_default::<S, RoomSnapshot>(&store, &codec, &room_id, &latest).await {
        supervisor.restore(snapshot);
    }
    let history_key = keys::alert_history(room_id.as_str());
    let notifications = load_or_default(&store, &codec, &room_id, &history_key)
        .await
        .unwrap_or_default();

    let mut countdown = TickScheduler::new(
        TickConfig::every(config.timer_period).with_policy(TickPolicy::Skip),
    );
    countdown.follow(supervisor.state().timer.running);

    let sampling = match (config.sensor_period, sensors.is_some()) {
        (Some(period), true) => TickScheduler::new(TickConfig::every(period)),
        _ => TickScheduler::disabled(),
    };

    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let actor = RoomActor {
        room_id: room_id.clone(),
        name: spec.name.clone(),
        supervisor,
        store,
        codec,
        sensors,
        history: SensorHistory::new(&spec.layout, config.history_capacity),
        notifications,
        subscribers: Vec::new(),
        countdown,
        sampling,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        name: spec.name,
        sender: tx,
    }
}
