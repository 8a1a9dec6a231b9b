// ── API routes ──
//
// The portal surface: authenticate, user create/lookup, thermostat
// create/lookup, and the ping probe. Handlers are async; PBKDF2 work is
// offloaded to the blocking pool so the event loop stays responsive.
// `PUT /api/user` is reserved and deliberately unrouted.

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{State, get, post, routes};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::password;
use crate::store::{CredentialStore, StoreError};

pub fn api_routes() -> Vec<rocket::Route> {
    routes![
        authenticate,
        get_user,
        create_user,
        create_thermostat,
        get_thermostat
    ]
}

pub fn root_routes() -> Vec<rocket::Route> {
    routes![ping]
}

// ── Bodies ───────────────────────────────────────────────────────────
//
// Request fields are all optional at the serde layer so absent keys
// reach the handler and fail with the API's own "Missing fields"
// instead of rocket's parse rejection.

#[derive(Debug, Deserialize)]
struct AuthenticateBody {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateUserBody {
    email: Option<String>,
    password: Option<String>,
    thermostat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateThermostatBody {
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionBody {
    email: String,
    thermostat_id: String,
}

#[derive(Debug, Serialize)]
struct UserBody {
    email: String,
}

#[derive(Debug, Serialize)]
struct ThermostatBody {
    id: String,
    registered: bool,
}

/// Trimmed, non-empty field or `Missing fields`.
fn required(field: Option<&String>) -> Result<&str, ApiError> {
    match field.map(|f| f.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::MissingFields),
    }
}

/// Passwords are credential material and pass through verbatim; only
/// absence or the empty string counts as missing.
fn required_password(field: Option<&String>) -> Result<&str, ApiError> {
    match field.map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::MissingFields),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

#[get("/ping")]
fn ping() -> String {
    chrono::Local::now().to_rfc3339()
}

#[post("/authenticate", data = "<body>")]
async fn authenticate(
    store: &State<CredentialStore>,
    body: Json<AuthenticateBody>,
) -> Result<Custom<Json<SessionBody>>, ApiError> {
    let email = required(body.email.as_ref())?.to_owned();
    let password = required_password(body.password.as_ref())?.to_owned();

    let user = match store.get_user(&email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            debug!(email, "authentication attempt for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let stored = user.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify(&stored, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("stored credential unreadable: {e}")))?;

    if !verified {
        return Err(ApiError::InvalidCredentials);
    }

    info!(email, thermostat_id = user.thermostat_id, "authenticated");
    Ok(Custom(
        Status::Created,
        Json(SessionBody {
            email: user.email,
            thermostat_id: user.thermostat_id,
        }),
    ))
}

#[get("/user?<email>")]
async fn get_user(
    store: &State<CredentialStore>,
    email: Option<String>,
) -> Result<Json<UserBody>, ApiError> {
    let email = required(email.as_ref())?;
    match store.get_user(email).await {
        Ok(user) => Ok(Json(UserBody { email: user.email })),
        Err(StoreError::NotFound) => Err(ApiError::UserNotFound),
        Err(e) => Err(e.into()),
    }
}

#[post("/user", data = "<body>")]
async fn create_user(
    store: &State<CredentialStore>,
    body: Json<CreateUserBody>,
) -> Result<Custom<Json<UserBody>>, ApiError> {
    let email = required(body.email.as_ref())?.to_owned();
    let password = required_password(body.password.as_ref())?.to_owned();
    let thermostat_id = required(body.thermostat_id.as_ref())?.to_owned();

    // The thermostat must exist and be unbound; the pre-check also
    // guards register_thermostat below against double registration.
    match store.get_thermostat(&thermostat_id).await {
        Ok(t) if t.registered => return Err(ApiError::ThermostatAlreadyRegistered),
        Ok(_) => {}
        Err(StoreError::NotFound) => return Err(ApiError::InvalidThermostat),
        Err(e) => return Err(e.into()),
    }

    if store.get_user(&email).await.is_ok() {
        return Err(ApiError::EmailInUse);
    }

    let packed = tokio::task::spawn_blocking(move || password::pack_new(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task failed: {e}")))?;

    // Insert before flipping `registered`; a failure here leaves no
    // orphaned registration.
    let user = match store.insert_user(&email, &packed, &thermostat_id).await {
        Ok(user) => user,
        Err(StoreError::AlreadyExists) => return Err(ApiError::EmailInUse),
        Err(e) => return Err(e.into()),
    };
    store.register_thermostat(&thermostat_id).await?;

    info!(email, thermostat_id, "user created");
    Ok(Custom(Status::Created, Json(UserBody { email: user.email })))
}

#[post("/thermostat", data = "<body>")]
async fn create_thermostat(
    store: &State<CredentialStore>,
    body: Json<CreateThermostatBody>,
) -> Result<Custom<Json<ThermostatBody>>, ApiError> {
    let id = required(body.id.as_ref())?;

    match store.insert_thermostat(id).await {
        Ok(record) => {
            info!(id, "thermostat provisioned");
            Ok(Custom(
                Status::Created,
                Json(ThermostatBody {
                    id: record.id,
                    registered: record.registered,
                }),
            ))
        }
        Err(StoreError::AlreadyExists) => Err(ApiError::ThermostatExists),
        Err(e) => Err(e.into()),
    }
}

#[get("/thermostat/<id>")]
async fn get_thermostat(
    store: &State<CredentialStore>,
    id: &str,
) -> Result<Json<ThermostatBody>, ApiError> {
    match store.get_thermostat(id).await {
        Ok(record) => Ok(Json(ThermostatBody {
            id: record.id,
            registered: record.registered,
        })),
        Err(StoreError::NotFound) => Err(ApiError::ThermostatNotFound),
        Err(e) => Err(e.into()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use rocket::http::Status;
    use serde_json::{Value, json};

    use crate::tests_common::spawn_client;

    async fn body_json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        response.into_json::<Value>().await.unwrap()
    }

    #[rocket::async_test]
    async fn ping_reports_the_current_time() {
        let (client, _guard) = spawn_client().await;
        let response = client.get("/ping").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&body).is_ok(), "{body}");
    }

    #[rocket::async_test]
    async fn register_and_authenticate_flow() {
        let (client, _guard) = spawn_client().await;

        // Provision the thermostat.
        let response = client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        assert_eq!(
            body_json(response).await,
            json!({"id": "t-1", "registered": false})
        );

        // Bind a user to it.
        let response = client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "hunter2", "thermostat_id": "t-1"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        assert_eq!(body_json(response).await, json!({"email": "a@x"}));

        // The thermostat flipped to registered.
        let response = client.get("/api/thermostat/t-1").dispatch().await;
        assert_eq!(
            body_json(response).await,
            json!({"id": "t-1", "registered": true})
        );

        // Correct credentials authenticate and return the binding.
        let response = client
            .post("/api/authenticate")
            .json(&json!({"email": "a@x", "password": "hunter2"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        assert_eq!(
            body_json(response).await,
            json!({"email": "a@x", "thermostat_id": "t-1"})
        );

        // A second user cannot bind the same thermostat.
        let response = client
            .post("/api/user")
            .json(&json!({"email": "b@x", "password": "pw", "thermostat_id": "t-1"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Thermostat ID already registered"})
        );
    }

    #[rocket::async_test]
    async fn wrong_password_is_unauthorized() {
        let (client, _guard) = spawn_client().await;
        client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;
        client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "hunter2", "thermostat_id": "t-1"}))
            .dispatch()
            .await;

        for (email, pw) in [("a@x", "wrong"), ("ghost@x", "hunter2")] {
            let response = client
                .post("/api/authenticate")
                .json(&json!({"email": email, "password": pw}))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Unauthorized);
            assert_eq!(
                body_json(response).await,
                json!({"message": "Invalid email and/or password"})
            );
        }
    }

    #[rocket::async_test]
    async fn passwords_keep_their_whitespace() {
        let (client, _guard) = spawn_client().await;
        client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;
        client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": " padded ", "thermostat_id": "t-1"}))
            .dispatch()
            .await;

        // The padding is part of the credential.
        let response = client
            .post("/api/authenticate")
            .json(&json!({"email": "a@x", "password": " padded "}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client
            .post("/api/authenticate")
            .json(&json!({"email": "a@x", "password": "padded"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn missing_fields_are_rejected() {
        let (client, _guard) = spawn_client().await;

        let cases = [
            ("/api/authenticate", json!({"email": "a@x"})),
            ("/api/authenticate", json!({"password": " "})),
            ("/api/user", json!({"email": "a@x", "password": "pw"})),
            ("/api/thermostat", json!({})),
        ];
        for (path, body) in cases {
            let response = client.post(path).json(&body).dispatch().await;
            assert_eq!(response.status(), Status::BadRequest, "{path} {body}");
            assert_eq!(
                body_json(response).await,
                json!({"message": "Missing fields"})
            );
        }

        let response = client.get("/api/user").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn unknown_records_are_not_found() {
        let (client, _guard) = spawn_client().await;

        let response = client.get("/api/user?email=ghost@x").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(
            body_json(response).await,
            json!({"message": "User not found"})
        );

        let response = client.get("/api/thermostat/ghost").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Thermostat not found"})
        );
    }

    #[rocket::async_test]
    async fn duplicate_thermostat_creation_is_rejected() {
        let (client, _guard) = spawn_client().await;
        client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;

        let response = client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Thermostat ID already exists"})
        );
    }

    #[rocket::async_test]
    async fn user_lookup_by_email() {
        let (client, _guard) = spawn_client().await;
        client
            .post("/api/thermostat")
            .json(&json!({"id": "t-1"}))
            .dispatch()
            .await;
        client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "pw", "thermostat_id": "t-1"}))
            .dispatch()
            .await;

        let response = client.get("/api/user?email=a@x").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await, json!({"email": "a@x"}));
    }

    #[rocket::async_test]
    async fn unknown_thermostat_rejects_user_creation() {
        let (client, _guard) = spawn_client().await;
        let response = client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "pw", "thermostat_id": "ghost"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Invalid thermostat ID"})
        );
    }

    #[rocket::async_test]
    async fn duplicate_email_rejects_user_creation() {
        let (client, _guard) = spawn_client().await;
        for id in ["t-1", "t-2"] {
            client
                .post("/api/thermostat")
                .json(&json!({"id": id}))
                .dispatch()
                .await;
        }
        client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "pw", "thermostat_id": "t-1"}))
            .dispatch()
            .await;

        let response = client
            .post("/api/user")
            .json(&json!({"email": "a@x", "password": "pw", "thermostat_id": "t-2"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Email already in use"})
        );

        // The failed attempt must not have bound the second thermostat.
        let response = client.get("/api/thermostat/t-2").dispatch().await;
        assert_eq!(
            body_json(response).await,
            json!({"id": "t-2", "registered": false})
        );
    }

    #[rocket::async_test]
    async fn put_user_stays_unrouted() {
        let (client, _guard) = spawn_client().await;
        let response = client
            .put("/api/user")
            .json(&json!({"email": "a@x"}))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
