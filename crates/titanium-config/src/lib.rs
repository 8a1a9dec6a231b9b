//! Shared configuration for the titanium CLI.
//!
//! TOML config merged with `TITANIUM_`-prefixed environment variables,
//! plus the durable session cache holding the authenticated user. The
//! core crate never reads configuration files — the CLI builds plain
//! config structs from this layer and passes them in.

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod session;

pub use session::SessionCache;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration for the CLI.
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// Portal base URL (the titanium server).
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Pub/sub bus connection settings.
    #[serde(default)]
    pub bus: BusSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            bus: BusSettings::default(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:3000".into()
}

/// Bus provider settings. The keys are opaque strings supplied by the
/// third-party service.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BusSettings {
    /// Service origin, e.g. `https://bus.example.net`.
    pub origin: Option<String>,

    pub publish_key: Option<String>,

    pub subscribe_key: Option<String>,

    /// Member id announced on the channel. Defaults to a generated
    /// `user-{uuid}` when unset.
    pub member_id: Option<String>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "titanium", "titanium")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Resolve the data directory holding durable client state (the
/// session cache).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("titanium");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from defaults + file + environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path (tests, `--config` overrides).
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TITANIUM_").split("__"));

    let config: AppConfig = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults when the file doesn't exist.
pub fn load_config_or_default() -> AppConfig {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:3000");
        assert!(cfg.bus.origin.is_none());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
server_url = "http://thermostat.example:8080"

[bus]
origin = "https://bus.example.net"
publish_key = "pub-k"
subscribe_key = "sub-k"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.server_url, "http://thermostat.example:8080");
        assert_eq!(cfg.bus.origin.as_deref(), Some("https://bus.example.net"));
        assert_eq!(cfg.bus.publish_key.as_deref(), Some("pub-k"));
        assert!(cfg.bus.member_id.is_none());
    }
}
