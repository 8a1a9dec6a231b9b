// ── API error envelope ──
//
// Every failure leaves the server as `{"message": <string>}` with the
// HTTP status carrying the class. Route handlers return `ApiError`;
// anything rocket rejects before a handler runs (bad JSON, unknown
// path) is converted by the catchers below.

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, catch, catchers};
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing fields")]
    MissingFields,

    /// Unknown email or bad password — deliberately the same message,
    /// so the response does not reveal whether the email exists.
    #[error("Invalid email and/or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Invalid thermostat ID")]
    InvalidThermostat,

    #[error("Thermostat ID already registered")]
    ThermostatAlreadyRegistered,

    #[error("Thermostat ID already exists")]
    ThermostatExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Thermostat not found")]
    ThermostatNotFound,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            Self::MissingFields
            | Self::EmailInUse
            | Self::InvalidThermostat
            | Self::ThermostatAlreadyRegistered
            | Self::ThermostatExists => Status::BadRequest,
            Self::InvalidCredentials => Status::Unauthorized,
            Self::UserNotFound | Self::ThermostatNotFound => Status::NotFound,
            Self::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if let Self::Internal(ref detail) = self {
            // Operators get the detail; clients get the generic body.
            tracing::error!(detail = %detail, "internal server error");
        }
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        rocket::response::status::Custom(status, body).respond_to(req)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => Self::Internal("unexpected duplicate record".into()),
            StoreError::NotFound => Self::Internal("unexpected missing record".into()),
            StoreError::Io(e) => Self::Internal(format!("store IO failed: {e}")),
            StoreError::Serialization(e) => Self::Internal(format!("record encode failed: {e}")),
        }
    }
}

// ── Catchers ─────────────────────────────────────────────────────────

#[catch(400)]
fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        message: "Missing fields".into(),
    })
}

/// Rocket reports undecodable JSON bodies as 422; the API surface
/// treats them like any other missing/invalid input.
#[catch(422)]
fn unprocessable() -> rocket::response::status::Custom<Json<ErrorBody>> {
    rocket::response::status::Custom(
        Status::BadRequest,
        Json(ErrorBody {
            message: "Missing fields".into(),
        }),
    )
}

#[catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        message: "Not found".into(),
    })
}

#[catch(500)]
fn internal() -> Json<ErrorBody> {
    Json(ErrorBody {
        message: "Internal server error".into(),
    })
}

#[catch(default)]
fn fallthrough(status: Status, _req: &Request<'_>) -> Json<ErrorBody> {
    Json(ErrorBody {
        message: status.reason_lossy().to_string(),
    })
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![bad_request, unprocessable, not_found, internal, fallthrough]
}
