//! REST client for the upstream maze game service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use tracing::debug;

use crate::config::Config;
use crate::maze::MazeSnapshot;
use crate::poll::{SnapshotSource, SourceError};

/// Client for the upstream game API. Cheap to clone.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

/// Game creation parameters, forwarded unchanged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGame {
    pub size: Number,
    pub distribution: Number,
    pub timelimit: Number,
    pub key: String,
}

/// Player registration body
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub styles: Value,
}

/// Game lifecycle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    Start,
    Stop,
    Reset,
}

impl GameCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            GameCommand::Start => "start",
            GameCommand::Stop => "stop",
            GameCommand::Reset => "reset",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            GameCommand::Start => "Start failed",
            GameCommand::Stop => "Stop failed",
            GameCommand::Reset => "Reset failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.upstream_base_url.clone(),
        })
    }

    /// Build an endpoint URL below the base, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and relay the upstream JSON body
    async fn relay(
        &self,
        request: RequestBuilder,
        fallback: &'static str,
    ) -> Result<Value, UpstreamError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let data: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = data
                .as_ref()
                .and_then(|d| {
                    ["error", "message"]
                        .iter()
                        .find_map(|key| d.get(key).and_then(Value::as_str))
                        .filter(|m| !m.is_empty())
                })
                .map(str::to_string)
                .or_else(|| (!text.is_empty() && data.is_none()).then(|| text.clone()))
                .unwrap_or_else(|| fallback.to_string());

            debug!(status = status.as_u16(), message = %message, "Upstream rejected request");

            let details = match data {
                Some(data) => data,
                None if text.is_empty() => Value::Null,
                None => Value::String(text),
            };
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                message,
                details,
            });
        }

        Ok(data.unwrap_or_else(|| json!({ "ok": true })))
    }

    pub async fn create_game(&self, game: &CreateGame) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", "create"])?;
        self.relay(self.client.post(url).json(game), "Game create failed")
            .await
    }

    pub async fn register_player(
        &self,
        game_id: &str,
        password: &str,
        registration: &Registration,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, "player", "register", password])?;
        self.relay(self.client.post(url).json(registration), "Registration failed")
            .await
    }

    pub async fn control_game(
        &self,
        game_id: &str,
        command: GameCommand,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, command.as_str()])?;
        self.relay(self.client.get(url), command.failure()).await
    }

    pub async fn move_player(
        &self,
        game_id: &str,
        authorization: &str,
        direction: Direction,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, "player", "move"])?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&json!({ "direction": direction }));
        self.relay(request, "Move failed").await
    }

    pub async fn shoot(
        &self,
        game_id: &str,
        authorization: &str,
        direction: Direction,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, "player", "ability", "shoot"])?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&json!({ "direction": direction }));
        self.relay(request, "Shoot failed").await
    }

    pub async fn bomb(&self, game_id: &str, authorization: &str) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, "player", "ability", "bomb"])?;
        let request = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization);
        self.relay(request, "Bomb failed").await
    }

    pub async fn player_status(
        &self,
        game_id: &str,
        authorization: &str,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["game", game_id, "player", "status"])?;
        let request = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization);
        self.relay(request, "Failed to fetch status").await
    }
}

/// Authorization header value for a raw player token
pub fn bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

#[async_trait]
impl SnapshotSource for UpstreamClient {
    async fn fetch(&self, game_id: &str, token: &str) -> Result<MazeSnapshot, SourceError> {
        let body = self
            .player_status(game_id, &bearer(token))
            .await
            .map_err(|e| match e {
                UpstreamError::Rejected {
                    status, message, ..
                } => SourceError::Rejected { status, message },
                other => SourceError::Transport(other.to_string()),
            })?;

        serde_json::from_value(body).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Upstream errors
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        details: Value,
    },

    #[error("Upstream base URL cannot carry a path")]
    InvalidBaseUrl,
}
