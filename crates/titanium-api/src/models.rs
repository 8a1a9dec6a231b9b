// Wire types for the portal HTTP API.

use serde::{Deserialize, Serialize};

/// Authenticated session returned by `POST /api/authenticate`.
///
/// This is the record the session cache persists between runs: the login
/// identity plus the thermostat channel it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub thermostat_id: String,
}

/// User summary returned by user creation and lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
}

/// Thermostat provisioning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thermostat {
    pub id: String,
    pub registered: bool,
}

/// The `{"message": …}` envelope the portal wraps every failure in.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
