//! Other-player and territory-claim overlays in display coordinates

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::rotate::{raw_to_rotated, rotate};
use super::snapshot::{MazeSnapshot, PlayerId, PlayerInfo, SnapshotError};

/// A cell of the rotated grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellKey {
    pub row: usize,
    pub col: usize,
}

impl CellKey {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

pub type PlayersOverlayMap = HashMap<CellKey, Vec<PlayerInfo>>;
pub type ClaimsOverlayMap = HashMap<CellKey, PlayerId>;

/// Overlays derived from one snapshot; recomputed, never patched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    pub players: PlayersOverlayMap,
    pub claims: ClaimsOverlayMap,
}

/// Compute both overlays for a snapshot.
///
/// Fails only when the maze itself is unusable; stray players and mismatched
/// claims are dropped.
pub fn compose_overlays(snapshot: &MazeSnapshot) -> Result<Overlays, SnapshotError> {
    let (height, width) = snapshot.dimensions()?;

    Ok(Overlays {
        players: players_overlay(snapshot, height, width),
        claims: claims_overlay(snapshot, height, width),
    })
}

fn players_overlay(snapshot: &MazeSnapshot, height: usize, width: usize) -> PlayersOverlayMap {
    // Snapshots are centered on the viewing player
    let center_row = (height / 2) as i128;
    let center_col = (width / 2) as i128;
    let me = snapshot.pos;

    let mut overlay = PlayersOverlayMap::new();
    for player in &snapshot.players {
        if snapshot.id == Some(player.id) {
            continue;
        }

        // Widened so that positions anywhere in the i64 range cannot overflow
        let dx = i128::from(player.pos.x) - i128::from(me.x);
        let dy = i128::from(player.pos.y) - i128::from(me.y);

        // +y is up on screen, i.e. towards lower row indices
        let raw_row = center_row - dy;
        let raw_col = center_col + dx;
        if !(0..height as i128).contains(&raw_row) || !(0..width as i128).contains(&raw_col) {
            continue;
        }

        let (row, col) = raw_to_rotated(raw_row as usize, raw_col as usize, width);
        overlay
            .entry(CellKey::new(row, col))
            .or_default()
            .push(player.clone());
    }

    overlay
}

fn claims_overlay(snapshot: &MazeSnapshot, height: usize, width: usize) -> ClaimsOverlayMap {
    let Some(claims) = snapshot.claims.as_ref() else {
        return ClaimsOverlayMap::new();
    };

    let rotated = match rotate(claims) {
        Ok(rotated) => rotated,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed claims matrix");
            return ClaimsOverlayMap::new();
        }
    };

    if claims.len() != height || rotated.len() != width {
        debug!(
            maze_height = height,
            maze_width = width,
            claims_height = claims.len(),
            claims_width = rotated.len(),
            "Ignoring claims matrix with mismatched dimensions"
        );
        return ClaimsOverlayMap::new();
    }

    rotated
        .iter()
        .enumerate()
        .flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, claimant)| !claimant.is_unclaimed())
                .map(move |(col, claimant)| (CellKey::new(row, col), *claimant))
        })
        .collect()
}
