//! Durable session cache.
//!
//! A JSON file holding the single `"user"` slot: the session record
//! returned by `POST /api/authenticate`. The CLI reads it at startup to
//! decide whether the dashboard can run without a fresh login.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use titanium_api::Session;

use crate::ConfigError;

/// On-disk shape: one named slot so the file stays self-describing.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    user: Session,
}

/// File-backed holder of the authenticated session.
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    /// Cache in the canonical data directory.
    pub fn new() -> Self {
        Self {
            path: crate::data_dir().join("session.json"),
        }
    }

    /// Cache at an explicit path (tests).
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Persist the authenticated session.
    pub fn store(&self, session: &Session) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&CacheFile {
            user: session.clone(),
        })
        .map_err(|e| ConfigError::Validation {
            field: "session".into(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, body)?;
        debug!(path = %self.path.display(), "session cached");
        Ok(())
    }

    /// Read the cached session. A missing or unreadable file is `None`,
    /// never an error — startup routing falls back to the login path.
    pub fn load(&self) -> Option<Session> {
        let body = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<CacheFile>(&body) {
            Ok(cache) => Some(cache.user),
            Err(e) => {
                debug!(error = %e, "ignoring unreadable session cache");
                None
            }
        }
    }

    /// Remove the cached session (logout).
    pub fn clear(&self) -> Result<(), ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample_session() -> Session {
        Session {
            email: "a@x".into(),
            thermostat_id: "t-1".into(),
        }
    }

    #[test]
    fn round_trips_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.json"));

        assert!(cache.load().is_none());
        cache.store(&sample_session()).unwrap();
        assert_eq!(cache.load(), Some(sample_session()));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.json"));

        cache.store(&sample_session()).unwrap();
        cache.clear().unwrap();
        cache.clear().unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn corrupt_cache_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = SessionCache::at_path(path);
        assert!(cache.load().is_none());
    }
}
