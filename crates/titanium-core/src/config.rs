// ── Bridge configuration ──
//
// Plain config struct consumed by [`ControlBridge`](crate::ControlBridge).
// The core crate never reads configuration files; binaries build this
// from their own config layer and pass it in.

use std::time::Duration;

/// Tunables for one bridge session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Interval between presence polls driving the `online` indicator.
    pub liveness_interval: Duration,

    /// Interval between `request_temperatures` polls while online.
    pub telemetry_interval: Duration,

    /// Idle window after a setpoint edit before the pending
    /// `update_temperature_range` is published. Any edit inside the
    /// window re-arms it.
    pub debounce_window: Duration,

    /// Setting names the dashboard may edit. Edits to any other name
    /// are dropped without publishing.
    pub editable_settings: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            liveness_interval: Duration::from_secs(60),
            telemetry_interval: Duration::from_secs(30),
            debounce_window: Duration::from_secs(5),
            editable_settings: vec!["City".into()],
        }
    }
}

impl BridgeConfig {
    /// Whether `name` is on the editable-settings allow-list.
    pub fn is_editable_setting(&self, name: &str) -> bool {
        self.editable_settings.iter().any(|s| s == name)
    }
}
