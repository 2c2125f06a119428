//! Snapshot source seam and the session it is polled with

use async_trait::async_trait;

use crate::maze::render::DEFAULT_SELF_COLOR;
use crate::maze::MazeSnapshot;

/// Identifiers a viewer polls with, passed explicitly into the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub game_id: String,
    pub token: String,
    /// Fill for the viewer's own tile
    pub color: String,
}

impl SessionContext {
    pub fn new(game_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            token: token.into(),
            color: DEFAULT_SELF_COLOR.to_string(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Polling requires both identifiers
    pub fn is_complete(&self) -> bool {
        !self.game_id.trim().is_empty() && !self.token.trim().is_empty()
    }
}

/// Failure to obtain a snapshot. The message is shown to the viewer as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid status response: {0}")]
    Parse(String),
}

/// Supplies the current snapshot for a game and player credential
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, game_id: &str, token: &str) -> Result<MazeSnapshot, SourceError>;
}
