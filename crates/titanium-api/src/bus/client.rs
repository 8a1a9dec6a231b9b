// Bus REST client
//
// Implements the Bus capability over the provider's HTTP surface:
// fire-and-forget publish, a long-poll subscribe loop that fans inbound
// payloads into a broadcast channel, and a here-now presence snapshot.
// One background task runs per subscribed channel; unsubscribe (or
// dropping the client) cancels it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::bus::Bus;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Channel capacity ─────────────────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Delay before the next poll after a failed subscribe request.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

// ── BusConfig ────────────────────────────────────────────────────────

/// Connection settings for the bus provider.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Service origin, e.g. `https://bus.example.net`.
    pub origin: Url,
    pub publish_key: String,
    pub subscribe_key: String,
    /// Member id this client announces on the channel. The device side
    /// subscribes with its thermostat id; the dashboard side uses a
    /// `user-…` id so presence can tell the two apart.
    pub member_id: String,
}

impl BusConfig {
    /// Build a config with a fresh `user-{uuid}` member id.
    pub fn new(origin: Url, publish_key: String, subscribe_key: String) -> Self {
        Self {
            origin,
            publish_key,
            subscribe_key,
            member_id: format!("user-{}", Uuid::new_v4()),
        }
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────

/// One long-poll response: the next timetoken plus any payloads
/// published since the previous one.
#[derive(Debug, Deserialize)]
struct SubscribeResponse {
    t: String,
    #[serde(default)]
    m: Vec<serde_json::Value>,
}

/// Here-now presence snapshot.
#[derive(Debug, Deserialize)]
struct PresenceResponse {
    #[serde(default)]
    uuids: Vec<String>,
}

// ── BusClient ────────────────────────────────────────────────────────

struct Subscription {
    cancel: CancellationToken,
    events: broadcast::Sender<Arc<serde_json::Value>>,
}

/// REST implementation of [`Bus`].
pub struct BusClient {
    http: reqwest::Client,
    config: BusConfig,
    root_cancel: CancellationToken,
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl BusClient {
    /// Create a new bus client from a `TransportConfig`.
    pub fn new(config: BusConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            config,
            root_cancel: CancellationToken::new(),
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    /// Create a bus client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: BusConfig) -> Self {
        Self {
            http,
            config,
            root_cancel: CancellationToken::new(),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// The member id announced on subscribe polls.
    pub fn member_id(&self) -> &str {
        &self.config.member_id
    }
}

impl Drop for BusClient {
    fn drop(&mut self) {
        self.root_cancel.cancel();
    }
}

#[async_trait]
impl Bus for BusClient {
    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<broadcast::Receiver<Arc<serde_json::Value>>, Error> {
        let mut subs = self.subscriptions.lock().await;
        if let Some(sub) = subs.get(channel) {
            return Ok(sub.events.subscribe());
        }

        // The initial poll (tt=0) establishes the session; its error is
        // the caller's error. Later poll failures only log.
        let (timetoken, pending) = poll_once(
            &self.http,
            &self.config.origin,
            &self.config.subscribe_key,
            &self.config.member_id,
            channel,
            "0",
        )
        .await?;

        debug!(channel, %timetoken, "bus session established");

        let (events, rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        for payload in pending {
            let _ = events.send(Arc::new(payload));
        }

        let cancel = self.root_cancel.child_token();
        tokio::spawn(poll_loop(
            self.http.clone(),
            self.config.origin.clone(),
            self.config.subscribe_key.clone(),
            self.config.member_id.clone(),
            channel.to_owned(),
            timetoken,
            events.clone(),
            cancel.clone(),
        ));

        subs.insert(channel.to_owned(), Subscription { cancel, events });
        Ok(rx)
    }

    async fn unsubscribe(&self, channel: &str) {
        let mut subs = self.subscriptions.lock().await;
        if let Some(sub) = subs.remove(channel) {
            debug!(channel, "unsubscribing");
            sub.cancel.cancel();
        }
    }

    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), Error> {
        let url = self.config.origin.join(&format!(
            "publish/{}/{}/{channel}",
            self.config.publish_key, self.config.subscribe_key
        ))?;
        debug!(channel, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Bus(format!("publish rejected (HTTP {status})")));
        }
        Ok(())
    }

    async fn presence(&self, channel: &str) -> Result<Vec<String>, Error> {
        let url = self.config.origin.join(&format!(
            "v2/presence/{}/{channel}",
            self.config.subscribe_key
        ))?;
        debug!(channel, "GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Bus(format!("presence failed (HTTP {status})")));
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: PresenceResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("invalid presence response: {e}"),
                body,
            }
        })?;
        Ok(parsed.uuids)
    }
}

// ── Long-poll loop ───────────────────────────────────────────────────

/// One subscribe request: `GET {origin}/subscribe/{key}/{channel}?tt=…&uuid=…`.
async fn poll_once(
    http: &reqwest::Client,
    origin: &Url,
    subscribe_key: &str,
    member_id: &str,
    channel: &str,
    timetoken: &str,
) -> Result<(String, Vec<serde_json::Value>), Error> {
    let mut url = origin.join(&format!("subscribe/{subscribe_key}/{channel}"))?;
    url.query_pairs_mut()
        .append_pair("tt", timetoken)
        .append_pair("uuid", member_id);

    let resp = http.get(url).send().await.map_err(Error::Transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Bus(format!("subscribe poll failed (HTTP {status})")));
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    let parsed: SubscribeResponse = serde_json::from_str(&body).map_err(|e| {
        Error::Deserialization {
            message: format!("invalid subscribe response: {e}"),
            body,
        }
    })?;
    Ok((parsed.t, parsed.m))
}

/// Main loop: poll → fan out → poll again with the returned timetoken.
#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    http: reqwest::Client,
    origin: Url,
    subscribe_key: String,
    member_id: String,
    channel: String,
    mut timetoken: String,
    events: broadcast::Sender<Arc<serde_json::Value>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = poll_once(&http, &origin, &subscribe_key, &member_id, &channel, &timetoken) => {
                match result {
                    Ok((next, payloads)) => {
                        timetoken = next;
                        for payload in payloads {
                            // Send errors just mean no active receivers right now.
                            let _ = events.send(Arc::new(payload));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, channel = %channel, "subscribe poll failed");
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                        }
                    }
                }
            }
        }
    }

    debug!(channel = %channel, "subscribe loop exiting");
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn member_id_defaults_to_user_prefix() {
        let config = BusConfig::new(
            Url::parse("https://bus.example.net").unwrap(),
            "pub-key".into(),
            "sub-key".into(),
        );
        assert!(config.member_id.starts_with("user-"));
    }

    #[test]
    fn subscribe_response_tolerates_missing_messages() {
        let parsed: SubscribeResponse = serde_json::from_str(r#"{"t":"17"}"#).unwrap();
        assert_eq!(parsed.t, "17");
        assert!(parsed.m.is_empty());
    }

    #[test]
    fn presence_response_parses_uuids() {
        let parsed: PresenceResponse =
            serde_json::from_str(r#"{"uuids":["t-1","user-abc"],"occupancy":2}"#).unwrap();
        assert_eq!(parsed.uuids, vec!["t-1", "user-abc"]);
    }
}
