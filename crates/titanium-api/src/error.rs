use thiserror::Error;

/// Top-level error type for the `titanium-api` crate.
///
/// Covers every failure mode across both API surfaces: the portal's HTTP
/// API and the pub/sub bus. `titanium-core` maps these into bridge-level
/// errors; the CLI maps them into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (unknown email or wrong password).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Portal API ──────────────────────────────────────────────────
    /// Structured error from the portal (parsed from the `{message}` envelope).
    #[error("Portal API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Bus ─────────────────────────────────────────────────────────
    /// Bus request rejected or the session could not be established.
    #[error("Bus error: {0}")]
    Bus(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" response from the portal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Bus(_) => true,
            _ => false,
        }
    }
}
