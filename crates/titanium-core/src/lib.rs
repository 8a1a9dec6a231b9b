// titanium-core: Control bridge between titanium-api and consumers.

pub mod bridge;
pub mod config;
pub mod error;
pub mod protocol;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{ConnectionState, ControlBridge};
pub use config::BridgeConfig;
pub use error::CoreError;
pub use protocol::{
    ClientMessage, DeviceMessage, HistorySample, Status, TemperatureReport, TemperatureScope,
    Temperatures, clamp_temperature,
};
pub use store::{Settings, SnapshotStore, StateStream};

/// Lower bound of every temperature value on the wire, in °C.
pub const MIN_TEMPERATURE: i32 = 0;

/// Upper bound of every temperature value on the wire, in °C.
pub const MAX_TEMPERATURE: i32 = 35;
