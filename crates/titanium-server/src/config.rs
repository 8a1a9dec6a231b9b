use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Server settings, layered defaults ← `titanium-server.toml` ←
/// `TITANIUM_SERVER_*` environment. A bare `PORT` variable is honored
/// too, matching how hosting platforms hand out the listen port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the built single-page app.
    pub app_root: PathBuf,
    /// Directory for the append-only credential logs.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            app_root: PathBuf::from("app"),
            data_dir: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("titanium-server.toml"))
            .merge(Env::prefixed("TITANIUM_SERVER_"))
            .merge(Env::raw().only(&["PORT"]))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_apply_without_any_overrides() {
        figment::Jail::expect_with(|_jail| {
            let config = ServerConfig::load().unwrap();
            assert_eq!(config.port, 3000);
            assert_eq!(config.app_root, PathBuf::from("app"));
            Ok(())
        });
    }

    #[test]
    fn bare_port_variable_wins() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PORT", "8123");
            let config = ServerConfig::load().unwrap();
            assert_eq!(config.port, 8123);
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "titanium-server.toml",
                r#"
                    port = 4000
                    data_dir = "/var/lib/titanium"
                "#,
            )?;
            let config = ServerConfig::load().unwrap();
            assert_eq!(config.port, 4000);
            assert_eq!(config.data_dir, PathBuf::from("/var/lib/titanium"));
            Ok(())
        });
    }
}
