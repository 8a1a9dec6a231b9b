//! CLI error types with miette diagnostics.
//!
//! Maps api/core/config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use titanium_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the portal at {url}")]
    #[diagnostic(
        code(titanium::connection_failed),
        help(
            "Check that the server is running and accessible.\n\
             Try: titanium ping --server {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not reach the thermostat bus")]
    #[diagnostic(
        code(titanium::bus_unreachable),
        help("Check the [bus] origin and keys in the config file.")
    )]
    BusUnreachable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(titanium::auth_failed),
        help("Verify the email and password, then: titanium login <email>")
    )]
    AuthFailed,

    #[error("Not signed in")]
    #[diagnostic(
        code(titanium::not_logged_in),
        help("Sign in first: titanium login <email>")
    )]
    NotLoggedIn,

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(code(titanium::not_found))]
    NotFound { resource: String, identifier: String },

    #[error("{message}")]
    #[diagnostic(code(titanium::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Portal error (HTTP {status}): {message}")]
    #[diagnostic(code(titanium::api_error))]
    Api { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(titanium::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Bus provider is not configured")]
    #[diagnostic(
        code(titanium::no_bus_config),
        help(
            "Set [bus] origin, publish_key and subscribe_key in the config file.\n\
             Find it with: titanium config path"
        )
    )]
    BusNotConfigured,

    #[error(transparent)]
    #[diagnostic(code(titanium::config))]
    Config(#[from] titanium_config::ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::BusUnreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NotLoggedIn => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Contextual mapping for portal lookups: turns a 404 into a
    /// `NotFound` naming the resource that was asked for.
    pub fn for_lookup(err: titanium_api::Error, resource: &str, identifier: &str) -> Self {
        if err.is_not_found() {
            return Self::NotFound {
                resource: resource.into(),
                identifier: identifier.into(),
            };
        }
        err.into()
    }
}

// ── api::Error → CliError mapping ────────────────────────────────────

impl From<titanium_api::Error> for CliError {
    fn from(err: titanium_api::Error) -> Self {
        match err {
            titanium_api::Error::Authentication { .. } => Self::AuthFailed,

            titanium_api::Error::Transport(e) => {
                let url = e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string);
                Self::ConnectionFailed {
                    url,
                    source: e.into(),
                }
            }

            // The portal phrases every duplicate as "… already …".
            titanium_api::Error::Api { status: _, message } if message.contains("already") => {
                Self::Conflict { message }
            }

            titanium_api::Error::Api { status, message } => Self::Api { status, message },

            titanium_api::Error::InvalidUrl(e) => Self::Validation {
                field: "server".into(),
                reason: e.to_string(),
            },

            titanium_api::Error::Bus(reason) => Self::BusUnreachable {
                source: reason.into(),
            },

            titanium_api::Error::Deserialization { message, .. } => Self::Api {
                status: 0,
                message,
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { .. } => Self::AuthFailed,

            CoreError::SubscribeFailed { channel, reason } => Self::BusUnreachable {
                source: format!("subscribe to '{channel}' failed: {reason}").into(),
            },

            CoreError::NotConnected => Self::BusUnreachable {
                source: "no active session".into(),
            },

            CoreError::Api { status, message } => Self::Api {
                status: status.unwrap_or(0),
                message,
            },

            other => Self::BusUnreachable {
                source: other.to_string().into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(CliError::AuthFailed.exit_code(), 3);
        assert_eq!(CliError::NotLoggedIn.exit_code(), 3);
        assert_eq!(
            CliError::NotFound {
                resource: "user".into(),
                identifier: "a@x".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(
            CliError::Conflict {
                message: "Email already in use".into()
            }
            .exit_code(),
            6
        );
        assert_eq!(
            CliError::Validation {
                field: "low".into(),
                reason: "not a number".into()
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn portal_conflicts_map_by_message() {
        let err = CliError::from(titanium_api::Error::Api {
            status: 400,
            message: "Thermostat ID already registered".into(),
        });
        assert!(matches!(err, CliError::Conflict { .. }));

        let err = CliError::from(titanium_api::Error::Api {
            status: 500,
            message: "Internal server error".into(),
        });
        assert!(matches!(err, CliError::Api { status: 500, .. }));
    }
}
