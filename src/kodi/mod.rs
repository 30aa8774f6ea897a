//! Kodi JSON-RPC client
//!
//! Drives the active Kodi player over `POST /jsonrpc`.
//! Documentation: https://kodi.wiki/view/JSON-RPC_API

pub mod time;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::KodiConfig;
use crate::kodi::time::KodiTime;
use crate::player::{AudioStreamMode, HostControl, Notifier, Player, PlayerError, SubtitleMode};

/// How long on-screen notifications stay up, in milliseconds.
const NOTIFICATION_DISPLAY_MS: u64 = 3000;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ActivePlayer {
    playerid: i64,
}

#[derive(Debug, Deserialize)]
struct PlayerProperties {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    time: KodiTime,
    #[serde(default)]
    totaltime: KodiTime,
}

pub struct KodiClient {
    client: Client,
    url: String,
    credentials: Option<(String, String)>,
    title: String,
}

impl KodiClient {
    pub fn new(client: Client, config: &KodiConfig) -> Self {
        let credentials = config
            .username
            .clone()
            .map(|user| (user, config.password.clone().unwrap_or_default()));
        Self {
            client,
            url: config.url.clone(),
            credentials,
            title: config.notification_title.clone(),
        }
    }

    /// Issue one JSON-RPC call and return its `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, PlayerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response: RpcResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(PlayerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        tracing::debug!("kodi {} ok", method);
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn active_player(&self) -> Result<Option<i64>, PlayerError> {
        let result = self.call("Player.GetActivePlayers", json!({})).await?;
        let players: Vec<ActivePlayer> = serde_json::from_value(result)
            .map_err(|e| PlayerError::Protocol(format!("Player.GetActivePlayers: {e}")))?;
        Ok(players.first().map(|p| p.playerid))
    }

    async fn require_player(&self) -> Result<i64, PlayerError> {
        self.active_player()
            .await?
            .ok_or_else(|| PlayerError::Protocol("no active player".to_string()))
    }

    async fn properties(&self) -> Result<Option<PlayerProperties>, PlayerError> {
        let Some(playerid) = self.active_player().await? else {
            return Ok(None);
        };
        let result = self
            .call(
                "Player.GetProperties",
                json!({ "playerid": playerid, "properties": ["speed", "time", "totaltime"] }),
            )
            .await?;
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| PlayerError::Protocol(format!("Player.GetProperties: {e}")))
    }

    async fn require_properties(&self) -> Result<PlayerProperties, PlayerError> {
        self.properties()
            .await?
            .ok_or_else(|| PlayerError::Protocol("no active player".to_string()))
    }
}

#[async_trait]
impl Player for KodiClient {
    async fn is_loaded(&self) -> Result<bool, PlayerError> {
        Ok(self.active_player().await?.is_some())
    }

    async fn is_playing(&self) -> Result<bool, PlayerError> {
        Ok(self.properties().await?.is_some_and(|p| p.speed != 0.0))
    }

    async fn is_paused(&self) -> Result<bool, PlayerError> {
        Ok(self.properties().await?.is_some_and(|p| p.speed == 0.0))
    }

    async fn position(&self) -> Result<Duration, PlayerError> {
        Ok(self.require_properties().await?.time.into())
    }

    async fn total(&self) -> Result<Duration, PlayerError> {
        Ok(self.require_properties().await?.totaltime.into())
    }

    async fn seek(&self, position: Duration) -> Result<(), PlayerError> {
        let playerid = self.require_player().await?;
        let time = KodiTime::from(position);
        self.call(
            "Player.Seek",
            json!({ "playerid": playerid, "value": { "time": time } }),
        )
        .await?;
        Ok(())
    }

    async fn toggle_play_pause(&self) -> Result<(), PlayerError> {
        let playerid = self.require_player().await?;
        self.call("Player.PlayPause", json!({ "playerid": playerid }))
            .await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        let playerid = self.require_player().await?;
        self.call("Player.Stop", json!({ "playerid": playerid }))
            .await?;
        Ok(())
    }

    async fn set_subtitle(&self, mode: SubtitleMode) -> Result<(), PlayerError> {
        let playerid = self.require_player().await?;
        self.call(
            "Player.SetSubtitle",
            json!({ "playerid": playerid, "subtitle": mode.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn set_audio_stream(&self, mode: AudioStreamMode) -> Result<(), PlayerError> {
        let playerid = self.require_player().await?;
        self.call(
            "Player.SetAudioStream",
            json!({ "playerid": playerid, "stream": mode.as_str() }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for KodiClient {
    async fn notify(&self, message: &str) {
        let params = json!({
            "title": self.title,
            "message": message,
            "displaytime": NOTIFICATION_DISPLAY_MS
        });
        if let Err(e) = self.call("GUI.ShowNotification", params).await {
            tracing::warn!("Could not show notification {:?}: {}", message, e);
        }
    }
}

#[async_trait]
impl HostControl for KodiClient {
    async fn shutdown_host(&self) -> Result<(), PlayerError> {
        tracing::info!("Requesting host shutdown");
        self.call("System.Shutdown", json!({})).await?;
        Ok(())
    }
}
