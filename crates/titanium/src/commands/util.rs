//! Shared helpers: portal/bus construction, session lookup, prompts.

use std::sync::Arc;

use secrecy::SecretString;
use titanium_api::{BusClient, BusConfig, PortalClient, Session, TransportConfig};
use titanium_config::{AppConfig, SessionCache, load_config_or_default};
use url::Url;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Effective config with the `--server` flag folded in.
pub fn effective_config(global: &GlobalOpts) -> AppConfig {
    let mut cfg = load_config_or_default();
    if let Some(server) = &global.server {
        cfg.server_url = server.clone();
    }
    cfg
}

pub fn portal_from(cfg: &AppConfig) -> Result<PortalClient, CliError> {
    let url: Url = cfg.server_url.parse().map_err(|e| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL '{}': {e}", cfg.server_url),
    })?;
    Ok(PortalClient::new(url, &TransportConfig::default())?)
}

pub fn portal(global: &GlobalOpts) -> Result<PortalClient, CliError> {
    portal_from(&effective_config(global))
}

/// Build the bus client from the `[bus]` config section. All three
/// provider fields are required; the member id defaults per session.
pub fn bus_from(cfg: &AppConfig) -> Result<Arc<BusClient>, CliError> {
    let (Some(origin), Some(publish_key), Some(subscribe_key)) = (
        cfg.bus.origin.as_ref(),
        cfg.bus.publish_key.as_ref(),
        cfg.bus.subscribe_key.as_ref(),
    ) else {
        return Err(CliError::BusNotConfigured);
    };

    let origin: Url = origin.parse().map_err(|e| CliError::Validation {
        field: "bus.origin".into(),
        reason: format!("invalid URL '{origin}': {e}"),
    })?;

    let mut bus_config = BusConfig::new(origin, publish_key.clone(), subscribe_key.clone());
    if let Some(member_id) = &cfg.bus.member_id {
        bus_config.member_id = member_id.clone();
    }

    Ok(Arc::new(BusClient::new(
        bus_config,
        &TransportConfig::default(),
    )?))
}

/// The cached session, or `NotLoggedIn`.
pub fn require_session() -> Result<Session, CliError> {
    SessionCache::new().load().ok_or(CliError::NotLoggedIn)
}

/// Resolve the password: flag/env value if given, interactive prompt
/// otherwise. `confirm` prompts twice and requires a match.
pub fn resolve_password(given: Option<String>, confirm: bool) -> Result<SecretString, CliError> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }

    let first = rpassword::prompt_password("Password: ")?;
    if confirm {
        let second = rpassword::prompt_password("Confirm password: ")?;
        if first != second {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "passwords do not match".into(),
            });
        }
    }
    if first.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(SecretString::from(first))
}
