// ── Snapshot store ──
//
// The observable client-side state for one bridge session. Every slot
// is a `watch` channel: mutations go through `send_modify`, observers
// get a [`StateStream`] with point-in-time reads and change
// notification. All mutation funnels through this store -- the bus pump
// task and the edit operations are the only writers.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::protocol::{
    DeviceMessage, HistorySample, Status, Temperatures, clamp_temperature,
};

/// Setting name → opaque value, as reported by the device.
pub type Settings = serde_json::Map<String, serde_json::Value>;

// ── StateStream ──────────────────────────────────────────────────────

/// A subscription to one snapshot slot.
///
/// Provides both point-in-time reads and reactive change notification.
pub struct StateStream<T: Clone + Send + Sync + 'static> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StateStream<T> {
    pub(crate) fn from_receiver(receiver: watch::Receiver<T>) -> Self {
        Self { receiver }
    }

    /// Read the latest value.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

// ── SnapshotStore ────────────────────────────────────────────────────

/// Watch-channel-per-slot holder of the session snapshot.
pub struct SnapshotStore {
    temperatures: watch::Sender<Temperatures>,
    status: watch::Sender<Status>,
    settings: watch::Sender<Arc<Settings>>,
    history: watch::Sender<Arc<Vec<HistorySample>>>,
    online: watch::Sender<bool>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (temperatures, _) = watch::channel(Temperatures::default());
        let (status, _) = watch::channel(Status::default());
        let (settings, _) = watch::channel(Arc::new(Settings::new()));
        let (history, _) = watch::channel(Arc::new(Vec::new()));
        let (online, _) = watch::channel(false);

        Self {
            temperatures,
            status,
            settings,
            history,
            online,
        }
    }

    // ── Inbound merge ────────────────────────────────────────────────

    /// Apply one decoded device message to the snapshot.
    ///
    /// Temperature fields overwrite per-field (absent fields keep their
    /// slot); a fresh snapshot therefore seeds all three atomically from
    /// the first full report. Settings merge key-by-key; history is
    /// replaced wholesale. Values are clamped at this ingress boundary.
    pub fn apply(&self, message: DeviceMessage) {
        match message {
            DeviceMessage::Temperatures(report) => {
                self.temperatures.send_modify(|t| {
                    if let Some(current) = report.current_temperature {
                        t.current = clamp_temperature(current);
                    }
                    if let Some(low) = report.temperature_low {
                        t.low = clamp_temperature(low);
                    }
                    if let Some(high) = report.temperature_high {
                        t.high = clamp_temperature(high);
                    }
                });
            }
            DeviceMessage::Mode { mode } => {
                self.status.send_modify(|s| s.mode = mode);
            }
            DeviceMessage::State { state } => {
                self.status.send_modify(|s| s.state = state);
            }
            DeviceMessage::Settings(incoming) => {
                self.settings.send_modify(|current| {
                    let mut merged = Settings::clone(current);
                    for (name, value) in incoming {
                        merged.insert(name, value);
                    }
                    *current = Arc::new(merged);
                });
            }
            DeviceMessage::History(samples) => {
                debug!(samples = samples.len(), "history replaced");
                self.history.send_modify(|h| *h = Arc::new(samples));
            }
            DeviceMessage::Unknown => {}
        }
    }

    // ── Setpoint edits ───────────────────────────────────────────────

    /// Set the low setpoint, clamping to the wire bounds and snapping
    /// the edited value to `high` if it would cross it. Returns the
    /// resulting pair.
    pub fn set_low(&self, value: i32) -> (i32, i32) {
        let mut pair = (0, 0);
        self.temperatures.send_modify(|t| {
            t.low = clamp_temperature(value).min(t.high);
            pair = (t.low, t.high);
        });
        pair
    }

    /// Set the high setpoint, clamping and snapping to `low` if it
    /// would cross it. Returns the resulting pair.
    pub fn set_high(&self, value: i32) -> (i32, i32) {
        let mut pair = (0, 0);
        self.temperatures.send_modify(|t| {
            t.high = clamp_temperature(value).max(t.low);
            pair = (t.low, t.high);
        });
        pair
    }

    /// The current setpoint pair.
    pub fn setpoints(&self) -> (i32, i32) {
        let t = *self.temperatures.borrow();
        (t.low, t.high)
    }

    // ── Liveness ─────────────────────────────────────────────────────

    pub fn set_online(&self, online: bool) {
        self.online.send_if_modified(|o| {
            let changed = *o != online;
            *o = online;
            changed
        });
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Discard the snapshot, returning every slot to its initial value.
    pub fn reset(&self) {
        self.temperatures
            .send_modify(|t| *t = Temperatures::default());
        self.status.send_modify(|s| *s = Status::default());
        self.settings.send_modify(|s| *s = Arc::new(Settings::new()));
        self.history.send_modify(|h| *h = Arc::new(Vec::new()));
        self.online.send_modify(|o| *o = false);
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn temperatures(&self) -> StateStream<Temperatures> {
        StateStream::from_receiver(self.temperatures.subscribe())
    }

    pub fn status(&self) -> StateStream<Status> {
        StateStream::from_receiver(self.status.subscribe())
    }

    pub fn settings(&self) -> StateStream<Arc<Settings>> {
        StateStream::from_receiver(self.settings.subscribe())
    }

    pub fn history(&self) -> StateStream<Arc<Vec<HistorySample>>> {
        StateStream::from_receiver(self.history.subscribe())
    }

    pub fn online(&self) -> StateStream<bool> {
        StateStream::from_receiver(self.online.subscribe())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
