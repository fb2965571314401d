use std::time::Duration;

use serde::Serialize;
use tracing::debug;

// Directory announcement consumed by the hub on startup and on every
// announce interval.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoPush<'a> {
    name: &'a str,
    port: u16,
    status: &'a str,
    player_count: u32,
    max_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCountPush {
    player_count: u32,
    port: u16,
}

// Thin reqwest client for the hub directory. The hub being down must never
// affect gameplay, so every call swallows its error after logging it.
#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    secret: String,
    name: String,
    port: u16,
    max_players: u32,
}

impl HubClient {
    pub fn new(
        base_url: impl Into<String>,
        secret: impl Into<String>,
        name: impl Into<String>,
        port: u16,
        max_players: u32,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            secret: secret.into(),
            name: name.into(),
            port,
            max_players,
        })
    }

    /// Full directory entry: registers us on the first call, refreshes the
    /// record on later ones.
    pub async fn push_server_info(&self, player_count: u32) {
        let url = format!("{}/serverdata", self.base_url);
        let body = ServerInfoPush {
            name: &self.name,
            port: self.port,
            status: "Online",
            player_count,
            max_count: self.max_players,
        };
        let result = self
            .http
            .post(url)
            .header("Authorization", &self.secret)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(err) = result {
            debug!(%err, "hub server-info push failed");
        }
    }

    /// Lightweight count-only update, sent on connect and disconnect.
    pub async fn push_player_count(&self, player_count: u32) {
        let url = format!("{}/playercount", self.base_url);
        let body = PlayerCountPush {
            player_count,
            port: self.port,
        };
        let result = self
            .http
            .post(url)
            .header("Authorization", &self.secret)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(err) = result {
            debug!(%err, "hub player-count push failed");
        }
    }
}
