// ── Core error types ──
//
// User-facing errors from titanium-core. Consumers never see raw HTTP
// status codes or bus wire detail; the `From<titanium_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot subscribe to thermostat channel '{channel}': {reason}")]
    SubscribeFailed { channel: String, reason: String },

    #[error("Bridge is not connected")]
    NotConnected,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Message encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<titanium_api::Error> for CoreError {
    fn from(err: titanium_api::Error) -> Self {
        match err {
            titanium_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            titanium_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            titanium_api::Error::Transport(e) => CoreError::Api {
                message: format!("transport failure: {e}"),
                status: None,
            },
            titanium_api::Error::InvalidUrl(e) => CoreError::Internal(format!("invalid URL: {e}")),
            titanium_api::Error::Bus(message) => CoreError::Api {
                message,
                status: None,
            },
            titanium_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("malformed response: {message}"),
                status: None,
            },
        }
    }
}
