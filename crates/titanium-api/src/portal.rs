// Portal HTTP client
//
// Wraps `reqwest::Client` with URL construction and `{message}` envelope
// handling for the titanium portal API: authentication, user records, and
// thermostat provisioning. Responses are returned as unwrapped domain
// structs -- the envelope is stripped before the caller sees it.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, Session, Thermostat, UserSummary};
use crate::transport::TransportConfig;

/// HTTP client for the titanium portal.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortalClient {
    /// Create a new portal client from a `TransportConfig`.
    ///
    /// The `base_url` should be the portal root, e.g. `http://localhost:3000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a portal client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /ping` -- returns the server's current date/time string.
    pub async fn ping(&self) -> Result<String, Error> {
        let url = self.base_url.join("ping")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("ping failed (HTTP {status})"),
            });
        }
        resp.text().await.map_err(Error::Transport)
    }

    /// `POST /api/authenticate` -- verify credentials, returning the
    /// session record that binds the user to a thermostat channel.
    ///
    /// Bad credentials (and unknown emails -- the portal does not
    /// distinguish) surface as [`Error::Authentication`].
    pub async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, Error> {
        let url = self.base_url.join("api/authenticate")?;
        debug!(email, "POST {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let session: Session = Self::parse_response(resp).await?;
        debug!(thermostat_id = %session.thermostat_id, "authenticated");
        Ok(session)
    }

    /// `GET /api/user?email=…` -- look up a user by email.
    pub async fn get_user(&self, email: &str) -> Result<UserSummary, Error> {
        let url = self.base_url.join("api/user")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// `POST /api/user` -- register a new user bound to an unregistered
    /// thermostat. The thermostat must already exist with
    /// `registered = false`.
    pub async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
        thermostat_id: &str,
    ) -> Result<UserSummary, Error> {
        let url = self.base_url.join("api/user")?;
        debug!(email, thermostat_id, "POST {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "thermostat_id": thermostat_id,
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// `POST /api/thermostat` -- provision a thermostat id. New entries
    /// start unregistered and become registered when a user binds to them.
    pub async fn create_thermostat(&self, id: &str) -> Result<Thermostat, Error> {
        let url = self.base_url.join("api/thermostat")?;
        debug!(id, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&json!({ "id": id }))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// `GET /api/thermostat/:id` -- look up a thermostat record.
    pub async fn get_thermostat(&self, id: &str) -> Result<Thermostat, Error> {
        let url = self.base_url.join(&format!("api/thermostat/{id}"))?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Decode a success body, or map a failure status through the
    /// `{message}` envelope. 401 becomes [`Error::Authentication`]; every
    /// other failure keeps its status in [`Error::Api`].
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));

            return Err(if status == reqwest::StatusCode::UNAUTHORIZED {
                Error::Authentication { message }
            } else {
                Error::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = truncate_preview(&body, 200);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

/// First `max` bytes of `body`, backed off to a char boundary so
/// multi-byte bodies never split mid-character.
fn truncate_preview(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
