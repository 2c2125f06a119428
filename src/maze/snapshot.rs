//! Snapshot wire types as returned by the upstream player-status endpoint

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::rotate::{ensure_rectangular, MatrixError};

/// Static maze content of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum TileKind {
    Floor,
    Wall,
    OutOfBounds,
    /// The viewing player's own tile (always the snapshot center)
    PlayerMarker,
}

impl TileKind {
    /// Numeric tile code used on the wire
    pub fn code(self) -> u8 {
        match self {
            TileKind::Floor => 0,
            TileKind::Wall => 1,
            TileKind::OutOfBounds => 2,
            TileKind::PlayerMarker => 3,
        }
    }
}

impl From<i64> for TileKind {
    /// Unknown codes are drawn as floor.
    fn from(code: i64) -> Self {
        match code {
            1 => TileKind::Wall,
            2 => TileKind::OutOfBounds,
            3 => TileKind::PlayerMarker,
            _ => TileKind::Floor,
        }
    }
}

impl From<TileKind> for u8 {
    fn from(tile: TileKind) -> Self {
        tile.code()
    }
}

/// Player identifier; `0` is reserved for "unclaimed" in claims matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub const UNCLAIMED: PlayerId = PlayerId(0);

    pub fn is_unclaimed(self) -> bool {
        self == Self::UNCLAIMED
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// World position. Sign convention is unrelated to matrix indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    #[serde(alias = "X")]
    pub x: i64,
    #[serde(alias = "Y")]
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

pub type MazeMatrix = Vec<Vec<TileKind>>;
pub type ClaimsMatrix = Vec<Vec<PlayerId>>;

/// A player as listed in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePlayer")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub pos: Position,
    /// Declared display color (CSS)
    pub color: Option<String>,
}

#[derive(Deserialize)]
struct WirePlayer {
    id: PlayerId,
    pos: Position,
    #[serde(default)]
    styles: Option<WireStyles>,
}

#[derive(Deserialize)]
struct WireStyles {
    #[serde(default)]
    color: Option<String>,
}

impl From<WirePlayer> for PlayerInfo {
    fn from(wire: WirePlayer) -> Self {
        Self {
            id: wire.id,
            pos: wire.pos,
            color: wire.styles.and_then(|s| s.color),
        }
    }
}

/// One atomic read of game state, centered on the viewing player.
///
/// Structural problems in `maze`, `claims` or `players` do not fail decoding;
/// the affected field decodes as absent and is judged later by
/// [`MazeSnapshot::dimensions`] and the overlay composer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MazeSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub maze: Option<MazeMatrix>,
    #[serde(default, deserialize_with = "lenient")]
    pub claims: Option<ClaimsMatrix>,
    #[serde(default, deserialize_with = "lenient_players")]
    pub players: Vec<PlayerInfo>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub pos: Position,
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<PlayerId>,
}

/// Snapshot that cannot be rendered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot has no maze matrix")]
    MissingMaze,

    #[error("malformed maze matrix: {0}")]
    Malformed(#[from] MatrixError),
}

impl MazeSnapshot {
    /// Raw `(height, width)` of the maze, validating rectangularity
    pub fn dimensions(&self) -> Result<(usize, usize), SnapshotError> {
        let maze = self.maze.as_ref().ok_or(SnapshotError::MissingMaze)?;
        Ok(ensure_rectangular(maze)?)
    }

    /// Declared color of any listed player, self included
    pub fn color_of(&self, id: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.color.as_deref())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_players<'de, D>(deserializer: D) -> Result<Vec<PlayerInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

fn lenient_position<'de, D>(deserializer: D) -> Result<Position, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}
