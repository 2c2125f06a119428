//! Maze viewport: snapshot decoding, rotation, overlays and cell rendering

pub mod overlay;
pub mod render;
pub mod rotate;
pub mod snapshot;

pub use overlay::{compose_overlays, CellKey, Overlays};
pub use render::{describe_cell, render, CellRenderDescriptor, RenderOutcome};
pub use rotate::{rotate, MatrixError};
pub use snapshot::{MazeSnapshot, PlayerId, PlayerInfo, Position, SnapshotError, TileKind};
