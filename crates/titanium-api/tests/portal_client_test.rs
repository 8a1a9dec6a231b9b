#![allow(clippy::unwrap_used)]
// Integration tests for `PortalClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use titanium_api::{Error, PortalClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PortalClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PortalClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn secret(password: &str) -> secrecy::SecretString {
    password.to_string().into()
}

// ── Ping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2026-08-21T10:00:00+00:00"))
        .mount(&server)
        .await;

    let stamp = client.ping().await.unwrap();
    assert_eq!(stamp, "2026-08-21T10:00:00+00:00");
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .and(body_json(json!({
            "email": "a@x",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "email": "a@x",
            "thermostat_id": "t-1"
        })))
        .mount(&server)
        .await;

    let session = client.authenticate("a@x", &secret("hunter2")).await.unwrap();

    assert_eq!(session.email, "a@x");
    assert_eq!(session.thermostat_id, "t-1");
}

#[tokio::test]
async fn test_authenticate_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid email and/or password"
        })))
        .mount(&server)
        .await;

    let result = client.authenticate("a@x", &secret("wrong")).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert_eq!(message, "Invalid email and/or password");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_authenticate_missing_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Missing fields"
        })))
        .mount(&server)
        .await;

    let result = client.authenticate("a@x", &secret("")).await;

    assert!(
        matches!(result, Err(Error::Api { status: 400, .. })),
        "expected 400 Api error, got: {result:?}"
    );
}

// ── User tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_user() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(query_param("email", "a@x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "a@x" })))
        .mount(&server)
        .await;

    let user = client.get_user("a@x").await.unwrap();
    assert_eq!(user.email, "a@x");
}

#[tokio::test]
async fn test_get_user_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "User not found"
        })))
        .mount(&server)
        .await;

    let result = client.get_user("nobody@x").await;

    match result {
        Err(ref e) => assert!(e.is_not_found(), "expected not-found, got: {e}"),
        Ok(_) => panic!("expected error"),
    }
}

#[tokio::test]
async fn test_create_user() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/user"))
        .and(body_json(json!({
            "email": "a@x",
            "password": "hunter2",
            "thermostat_id": "t-1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "email": "a@x" })))
        .mount(&server)
        .await;

    let user = client
        .create_user("a@x", &secret("hunter2"), "t-1")
        .await
        .unwrap();
    assert_eq!(user.email, "a@x");
}

#[tokio::test]
async fn test_create_user_thermostat_already_registered() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Thermostat ID already registered"
        })))
        .mount(&server)
        .await;

    let result = client.create_user("b@x", &secret("pw"), "t-1").await;

    match result {
        Err(Error::Api {
            status: 400,
            ref message,
        }) => {
            assert_eq!(message, "Thermostat ID already registered");
        }
        other => panic!("expected 400 Api error, got: {other:?}"),
    }
}

// ── Thermostat tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_create_thermostat() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/thermostat"))
        .and(body_json(json!({ "id": "t-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t-1",
            "registered": false
        })))
        .mount(&server)
        .await;

    let thermostat = client.create_thermostat("t-1").await.unwrap();
    assert_eq!(thermostat.id, "t-1");
    assert!(!thermostat.registered);
}

#[tokio::test]
async fn test_get_thermostat() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/thermostat/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-1",
            "registered": true
        })))
        .mount(&server)
        .await;

    let thermostat = client.get_thermostat("t-1").await.unwrap();
    assert_eq!(thermostat.id, "t-1");
    assert!(thermostat.registered);
}

#[tokio::test]
async fn test_undecodable_multibyte_body_is_an_error_not_a_panic() {
    let (server, client) = setup().await;

    // A 2xx body that is not the expected shape and is dense multi-byte
    // UTF-8, so the error preview cannot cut at a fixed byte offset.
    Mock::given(method("GET"))
        .and(path("/api/thermostat/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("€".repeat(100)))
        .mount(&server)
        .await;

    let result = client.get_thermostat("t-1").await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_thermostat_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/thermostat/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Thermostat not found"
        })))
        .mount(&server)
        .await;

    let result = client.get_thermostat("ghost").await;
    assert!(
        matches!(result, Err(ref e) if e.is_not_found()),
        "expected not-found, got: {result:?}"
    );
}
