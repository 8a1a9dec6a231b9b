// ── Wire protocol ──
//
// Every bus message is a JSON object with an `action` discriminant.
// Inbound (device → dashboard) messages carry their payload under
// `data`; outbound (dashboard → device) messages are flat. Unknown
// inbound actions decode to [`DeviceMessage::Unknown`] and are dropped
// by the caller without disturbing the snapshot.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{MAX_TEMPERATURE, MIN_TEMPERATURE};

/// Clamp a temperature to the agreed wire bounds.
pub fn clamp_temperature(value: i32) -> i32 {
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

// ── Snapshot slots ───────────────────────────────────────────────────

/// Current reading plus the desired setpoint range.
///
/// Zero means "not yet reported" until the device first populates a
/// slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperatures {
    pub current: i32,
    pub low: i32,
    pub high: i32,
}

/// Operating mode plus the free-form state string the device reports
/// (heating / cooling / inactive flavors in the reference firmware).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub mode: String,
    pub state: String,
}

/// One cell of the weekly history heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    /// Day of week, 1..=7.
    pub day: u8,
    /// Hour of day, 1..=24.
    pub hour: u8,
    pub value: f64,
}

// ── Inbound messages ─────────────────────────────────────────────────

/// Partial temperature update; each present field overwrites its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TemperatureReport {
    pub current_temperature: Option<i32>,
    pub temperature_low: Option<i32>,
    pub temperature_high: Option<i32>,
}

/// Telemetry published by the device on the thermostat channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum DeviceMessage {
    #[serde(rename = "temperature_data")]
    Temperatures(TemperatureReport),

    #[serde(rename = "mode_data")]
    Mode { mode: String },

    #[serde(rename = "state_data")]
    State { state: String },

    /// Mapping from setting name to opaque value, merged into the
    /// snapshot (existing keys overwritten, others preserved).
    #[serde(rename = "settings_data")]
    Settings(serde_json::Map<String, serde_json::Value>),

    /// Replaces the history sequence wholesale.
    #[serde(rename = "history_data")]
    History(Vec<HistorySample>),

    /// Any action tag outside the agreed set.
    #[serde(other)]
    Unknown,
}

impl DeviceMessage {
    /// Decode one inbound payload, or `None` for anything the bridge
    /// should ignore. Unknown actions and undecodable payloads are
    /// logged at `warn` and dropped; neither tears the session down.
    pub fn decode(payload: &serde_json::Value) -> Option<Self> {
        match Self::deserialize(payload) {
            Ok(Self::Unknown) => {
                let action = payload
                    .get("action")
                    .and_then(|a| a.as_str())
                    .unwrap_or("<missing>");
                warn!(action, "ignoring unknown device action");
                None
            }
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, "ignoring undecodable device message");
                None
            }
        }
    }
}

// ── Outbound messages ────────────────────────────────────────────────

/// Scope of a `request_temperatures` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureScope {
    /// Full refresh: current reading plus the setpoint range.
    All,
    /// Current reading only (periodic telemetry poll).
    Current,
}

/// Requests and edits published by the dashboard side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "request_temperatures")]
    RequestTemperatures { value: TemperatureScope },

    #[serde(rename = "request_mode")]
    RequestMode,

    #[serde(rename = "request_settings")]
    RequestSettings,

    #[serde(rename = "request_history")]
    RequestHistory,

    #[serde(rename = "update_mode")]
    UpdateMode { mode: String },

    #[serde(rename = "update_setting")]
    UpdateSetting {
        setting_name: String,
        setting_value: serde_json::Value,
    },

    #[serde(rename = "update_temperature_range")]
    UpdateTemperatureRange {
        temperature_low: i32,
        temperature_high: i32,
    },
}

impl ClientMessage {
    /// Build a range update, clamping both ends to the wire bounds.
    pub fn temperature_range(low: i32, high: i32) -> Self {
        Self::UpdateTemperatureRange {
            temperature_low: clamp_temperature(low),
            temperature_high: clamp_temperature(high),
        }
    }

    /// Serialize for publishing.
    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of these shapes cannot fail; fall back to an
        // empty object rather than panicking in a timer path.
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
