// ── Control bridge ──
//
// Full lifecycle management for one thermostat session. Owns the live
// bus subscription, the snapshot store, the periodic liveness and
// telemetry polls, and the debounced setpoint write-back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use titanium_api::Bus;

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::protocol::{ClientMessage, DeviceMessage, TemperatureScope};
use crate::store::{SnapshotStore, StateStream};

// ── ConnectionState ──────────────────────────────────────────────────

/// Session lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
}

// ── ControlBridge ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. `connect` binds the bridge
/// to one thermostat channel and spawns the background tasks; edits and
/// observers operate on the shared snapshot until `disconnect`.
#[derive(Clone)]
pub struct ControlBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    bus: Arc<dyn Bus>,
    store: Arc<SnapshotStore>,
    connection_state: watch::Sender<ConnectionState>,
    /// Bound channel name (the thermostat id) while connected.
    channel: std::sync::Mutex<Option<String>>,
    /// Nudges the debounce task; present only while connected.
    edit_tx: std::sync::Mutex<Option<mpsc::UnboundedSender<()>>>,
    cancel: CancellationToken,
    /// Child token for the current session — cancelled on disconnect,
    /// replaced on reconnect (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ControlBridge {
    /// Create a new bridge. Does NOT connect — call
    /// [`connect()`](Self::connect) to subscribe and start the polls.
    pub fn new(config: BridgeConfig, bus: Arc<dyn Bus>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(BridgeInner {
                config,
                bus,
                store: Arc::new(SnapshotStore::new()),
                connection_state,
                channel: std::sync::Mutex::new(None),
                edit_tx: std::sync::Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Bind to `thermostat_id` and subscribe to its channel.
    ///
    /// Resolves once the bus session is established, then spawns the
    /// pump, liveness, telemetry, and debounce tasks and issues the
    /// one-shot refresh. A subscribe failure is the only bus error
    /// surfaced to the caller.
    pub async fn connect(&self, thermostat_id: &str) -> Result<(), CoreError> {
        // A live session would leave its tasks uncancellable once the
        // child token is replaced below; retire it first.
        if self.bound_channel().is_some() {
            self.disconnect().await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        // Fresh child token for this session (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let channel = thermostat_id.to_owned();
        let inbound = match self.inner.bus.subscribe(&channel).await {
            Ok(rx) => rx,
            Err(e) => {
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Disconnected);
                return Err(CoreError::SubscribeFailed {
                    channel,
                    reason: e.to_string(),
                });
            }
        };

        *self
            .inner
            .channel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(channel.clone());

        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        *self
            .inner
            .edit_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(edit_tx);

        let mut handles = self.inner.task_handles.lock().await;

        handles.push(tokio::spawn(pump_task(
            Arc::clone(&self.inner.store),
            inbound,
            child.clone(),
        )));
        handles.push(tokio::spawn(liveness_task(
            Arc::clone(&self.inner.bus),
            Arc::clone(&self.inner.store),
            channel.clone(),
            self.inner.config.liveness_interval,
            child.clone(),
        )));
        handles.push(tokio::spawn(telemetry_task(
            Arc::clone(&self.inner.bus),
            Arc::clone(&self.inner.store),
            channel.clone(),
            self.inner.config.telemetry_interval,
            child.clone(),
        )));
        handles.push(tokio::spawn(debounce_task(
            Arc::clone(&self.inner.bus),
            Arc::clone(&self.inner.store),
            channel.clone(),
            self.inner.config.debounce_window,
            edit_rx,
            child.clone(),
        )));
        drop(handles);

        self.inner
            .connection_state
            .send_replace(ConnectionState::Subscribed);
        info!(channel, "bridge subscribed");

        // One-shot full refresh so the dashboard has data immediately.
        self.refresh().await;
        Ok(())
    }

    /// Tear the session down: cancel the poll and debounce tasks,
    /// unsubscribe, and discard the snapshot.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent — allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        let channel = self
            .inner
            .channel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        *self
            .inner
            .edit_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;

        if let Some(channel) = channel {
            self.inner.bus.unsubscribe(&channel).await;
        }

        self.inner.store.reset();
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("bridge disconnected");
    }

    /// One-shot liveness check: `true` iff the bus presence set for the
    /// bound channel contains the thermostat id.
    pub async fn check_online(&self) -> Result<bool, CoreError> {
        let channel = self.bound_channel().ok_or(CoreError::NotConnected)?;
        let members = self.inner.bus.presence(&channel).await?;
        Ok(members.iter().any(|m| *m == channel))
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Move the low setpoint. Clamps, snaps to `high` if it would
    /// cross, and (re)arms the debounced write-back.
    pub fn set_temperature_low(&self, value: i32) -> (i32, i32) {
        let pair = self.inner.store.set_low(value);
        self.nudge_debounce();
        pair
    }

    /// Move the high setpoint. Clamps, snaps to `low` if it would
    /// cross, and (re)arms the debounced write-back.
    pub fn set_temperature_high(&self, value: i32) -> (i32, i32) {
        let pair = self.inner.store.set_high(value);
        self.nudge_debounce();
        pair
    }

    /// Publish an `update_mode` immediately. The device confirms with
    /// `mode_data`, which is what updates the snapshot.
    pub async fn set_mode(&self, mode: &str) {
        self.publish(ClientMessage::UpdateMode { mode: mode.into() })
            .await;
    }

    /// Publish an `update_setting` for an allow-listed name. Edits to
    /// any other name are dropped.
    pub async fn set_setting(&self, name: &str, value: serde_json::Value) {
        if !self.inner.config.is_editable_setting(name) {
            debug!(name, "dropping edit to non-editable setting");
            return;
        }
        self.publish(ClientMessage::UpdateSetting {
            setting_name: name.into(),
            setting_value: value,
        })
        .await;
    }

    /// Ask the device for the history sequence.
    pub async fn request_history(&self) {
        self.publish(ClientMessage::RequestHistory).await;
    }

    /// Re-issue the post-connect refresh trio: full temperatures, mode,
    /// settings.
    pub async fn refresh(&self) {
        self.publish(ClientMessage::RequestTemperatures {
            value: TemperatureScope::All,
        })
        .await;
        self.publish(ClientMessage::RequestMode).await;
        self.publish(ClientMessage::RequestSettings).await;
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> StateStream<ConnectionState> {
        StateStream::from_receiver(self.inner.connection_state.subscribe())
    }

    pub fn temperatures(&self) -> StateStream<crate::protocol::Temperatures> {
        self.inner.store.temperatures()
    }

    pub fn status(&self) -> StateStream<crate::protocol::Status> {
        self.inner.store.status()
    }

    pub fn settings(&self) -> StateStream<Arc<crate::store::Settings>> {
        self.inner.store.settings()
    }

    pub fn history(&self) -> StateStream<Arc<Vec<crate::protocol::HistorySample>>> {
        self.inner.store.history()
    }

    pub fn online(&self) -> StateStream<bool> {
        self.inner.store.online()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn bound_channel(&self) -> Option<String> {
        self.inner
            .channel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn nudge_debounce(&self) {
        let guard = self
            .inner
            .edit_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(());
        }
    }

    /// Fire-and-forget publish on the bound channel.
    async fn publish(&self, message: ClientMessage) {
        let Some(channel) = self.bound_channel() else {
            debug!("dropping publish while disconnected");
            return;
        };
        if let Err(e) = self.inner.bus.publish(&channel, message.to_value()).await {
            debug!(error = %e, channel, "publish failed");
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Single writer for bus-originated snapshot mutation. Decodes each
/// inbound payload and applies it in arrival order.
async fn pump_task(
    store: Arc<SnapshotStore>,
    mut inbound: broadcast::Receiver<Arc<serde_json::Value>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = inbound.recv() => {
                match result {
                    Ok(payload) => {
                        if let Some(message) = DeviceMessage::decode(&payload) {
                            store.apply(message);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "bus pump lagged behind delivery");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("pump task exiting");
}

/// Periodic presence poll driving the `online` indicator.
async fn liveness_task(
    bus: Arc<dyn Bus>,
    store: Arc<SnapshotStore>,
    channel: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match bus.presence(&channel).await {
                    Ok(members) => {
                        let online = members.iter().any(|m| *m == channel);
                        debug!(channel, online, "presence poll");
                        store.set_online(online);
                    }
                    Err(e) => warn!(error = %e, channel, "presence poll failed"),
                }
            }
        }
    }
}

/// Periodic `request_temperatures` poll, gated on the last liveness
/// result.
async fn telemetry_task(
    bus: Arc<dyn Bus>,
    store: Arc<SnapshotStore>,
    channel: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let request = ClientMessage::RequestTemperatures {
        value: TemperatureScope::Current,
    };
    // First tick one full interval out; the post-connect refresh already
    // covers t=0.
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !store.is_online() {
                    continue;
                }
                if let Err(e) = bus.publish(&channel, request.to_value()).await {
                    debug!(error = %e, channel, "telemetry poll publish failed");
                }
            }
        }
    }
}

/// Collapses setpoint edits into a single `update_temperature_range`.
///
/// Each nudge (re)arms the window; when it passes untouched and the
/// device is online, the current pair is published once. Cancellation
/// drops any pending write.
async fn debounce_task(
    bus: Arc<dyn Bus>,
    store: Arc<SnapshotStore>,
    channel: String,
    window: Duration,
    mut edits: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    'idle: loop {
        // Wait for the first edit.
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            nudge = edits.recv() => {
                if nudge.is_none() {
                    return;
                }
            }
        }

        // Armed: every further edit restarts the window.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                nudge = edits.recv() => {
                    if nudge.is_none() {
                        return;
                    }
                }
                () = tokio::time::sleep(window) => {
                    if store.is_online() {
                        let (low, high) = store.setpoints();
                        debug!(channel, low, high, "publishing setpoint range");
                        let message = ClientMessage::temperature_range(low, high);
                        if let Err(e) = bus.publish(&channel, message.to_value()).await {
                            debug!(error = %e, channel, "setpoint publish failed");
                        }
                    }
                    continue 'idle;
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
