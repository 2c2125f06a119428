//! Per-cell render descriptors for the presentation layer

use serde::Serialize;
use tracing::debug;

use super::overlay::{compose_overlays, CellKey};
use super::rotate::rotate;
use super::snapshot::{MazeSnapshot, PlayerId, PlayerInfo, TileKind};

pub const FLOOR_FILL: &str = "#ffffff";
pub const WALL_FILL: &str = "#27272a";
pub const OUT_OF_BOUNDS_FILL: &str = "#a1a1aa";
/// Marker color for occupants without a declared color
pub const PLAYER_FALLBACK_COLOR: &str = "#38bdf8";
pub const DEFAULT_SELF_COLOR: &str = "#ff0000";
pub const CLAIM_TINT_OPACITY: f32 = 0.3;

/// Translucent claim overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimTint {
    pub claimant: PlayerId,
    pub color: String,
    pub opacity: f32,
}

/// Indicator for other players standing on the cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerMarker {
    pub color: String,
    pub count: usize,
}

/// Everything needed to paint one cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRenderDescriptor {
    pub row: usize,
    pub col: usize,
    pub tile: TileKind,
    pub fill: String,
    pub claim: Option<ClaimTint>,
    pub players: Option<PlayerMarker>,
    /// Accessible description. The `v` value is the normalized tile code, so
    /// unknown upstream codes read as floor (`v0`).
    pub label: String,
}

/// Result of rendering the latest snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Nothing received yet, or the snapshot was unusable
    NoData,
    Grid {
        width: usize,
        height: usize,
        cells: Vec<Vec<CellRenderDescriptor>>,
    },
}

impl RenderOutcome {
    pub fn is_grid(&self) -> bool {
        matches!(self, RenderOutcome::Grid { .. })
    }
}

/// Stable hue for a claimant without a declared color
pub fn claim_hue(id: PlayerId) -> String {
    let hue = (id.0 as f64 * 137.5) % 360.0;
    format!("hsl({}, 70%, 50%)", hue)
}

fn base_fill(tile: TileKind, self_color: &str) -> String {
    match tile {
        TileKind::Floor => FLOOR_FILL,
        TileKind::Wall => WALL_FILL,
        TileKind::OutOfBounds => OUT_OF_BOUNDS_FILL,
        TileKind::PlayerMarker => self_color,
    }
    .to_string()
}

/// Describe a single cell. Pure and total.
///
/// The returned descriptor has `row`/`col` zeroed; [`render`] fills them in.
pub fn describe_cell<'a>(
    tile: TileKind,
    claim: Option<PlayerId>,
    occupants: &[PlayerInfo],
    self_color: &str,
    resolve_color: impl Fn(PlayerId) -> Option<&'a str>,
) -> CellRenderDescriptor {
    let claim = claim
        .filter(|claimant| !claimant.is_unclaimed() && tile != TileKind::PlayerMarker)
        .map(|claimant| ClaimTint {
            claimant,
            color: resolve_color(claimant)
                .map(str::to_string)
                .unwrap_or_else(|| claim_hue(claimant)),
            opacity: CLAIM_TINT_OPACITY,
        });

    let players = (!occupants.is_empty()).then(|| PlayerMarker {
        color: occupants
            .iter()
            .find_map(|p| p.color.clone())
            .unwrap_or_else(|| PLAYER_FALLBACK_COLOR.to_string()),
        count: occupants.len(),
    });

    CellRenderDescriptor {
        row: 0,
        col: 0,
        tile,
        fill: base_fill(tile, self_color),
        claim,
        players,
        label: String::new(),
    }
}

fn label(row: usize, col: usize, cell: &CellRenderDescriptor) -> String {
    let mut label = format!("r{} c{} v{}", row, col, cell.tile.code());
    if let Some(marker) = &cell.players {
        label.push_str(&format!(" players:{}", marker.count));
    }
    if let Some(tint) = &cell.claim {
        label.push_str(&format!(" claimed:{}", tint.claimant));
    }
    label
}

/// Render a snapshot into display-oriented cell descriptors.
///
/// Called once per accepted snapshot; unusable snapshots render as
/// [`RenderOutcome::NoData`].
pub fn render(snapshot: &MazeSnapshot, self_color: &str) -> RenderOutcome {
    let Some(maze) = snapshot.maze.as_ref() else {
        return RenderOutcome::NoData;
    };

    let overlays = match compose_overlays(snapshot) {
        Ok(overlays) => overlays,
        Err(e) => {
            debug!(error = %e, "Snapshot not renderable");
            return RenderOutcome::NoData;
        }
    };

    let Ok(grid) = rotate(maze) else {
        return RenderOutcome::NoData;
    };
    if grid.is_empty() || grid[0].is_empty() {
        return RenderOutcome::NoData;
    }

    let cells: Vec<Vec<CellRenderDescriptor>> = grid
        .iter()
        .enumerate()
        .map(|(row, tiles)| {
            tiles
                .iter()
                .enumerate()
                .map(|(col, &tile)| {
                    let key = CellKey::new(row, col);
                    let occupants = overlays
                        .players
                        .get(&key)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let mut cell = describe_cell(
                        tile,
                        overlays.claims.get(&key).copied(),
                        occupants,
                        self_color,
                        |id| snapshot.color_of(id),
                    );
                    cell.row = row;
                    cell.col = col;
                    cell.label = label(row, col, &cell);
                    cell
                })
                .collect()
        })
        .collect();

    RenderOutcome::Grid {
        width: cells[0].len(),
        height: cells.len(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::snapshot::Position;
    use serde_json::json;

    fn no_colors(_: PlayerId) -> Option<&'static str> {
        None
    }

    fn other(id: u64, color: Option<&str>) -> PlayerInfo {
        PlayerInfo {
            id: PlayerId(id),
            pos: Position::default(),
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn base_fill_follows_tile_kind() {
        let fill = |tile| describe_cell(tile, None, &[], "#123456", no_colors).fill;
        assert_eq!(fill(TileKind::Floor), FLOOR_FILL);
        assert_eq!(fill(TileKind::Wall), WALL_FILL);
        assert_eq!(fill(TileKind::OutOfBounds), OUT_OF_BOUNDS_FILL);
        assert_eq!(fill(TileKind::PlayerMarker), "#123456");
    }

    #[test]
    fn claim_tint_prefers_declared_color() {
        let cell = describe_cell(TileKind::Floor, Some(PlayerId(4)), &[], "#fff", |id| {
            (id == PlayerId(4)).then_some("#abcdef")
        });
        let tint = cell.claim.unwrap();
        assert_eq!(tint.color, "#abcdef");
        assert_eq!(tint.opacity, CLAIM_TINT_OPACITY);
    }

    #[test]
    fn claim_tint_falls_back_to_derived_hue() {
        let cell = describe_cell(TileKind::Wall, Some(PlayerId(2)), &[], "#fff", no_colors);
        assert_eq!(cell.claim.unwrap().color, "hsl(275, 70%, 50%)");
        assert_eq!(claim_hue(PlayerId(1)), "hsl(137.5, 70%, 50%)");
        assert_eq!(claim_hue(PlayerId(2)), claim_hue(PlayerId(2)));
    }

    #[test]
    fn player_marker_cell_is_never_tinted() {
        let cell = describe_cell(
            TileKind::PlayerMarker,
            Some(PlayerId(4)),
            &[],
            "#fff",
            no_colors,
        );
        assert_eq!(cell.claim, None);
    }

    #[test]
    fn occupant_marker_uses_first_declared_color() {
        let occupants = [other(2, None), other(3, Some("#00ff00")), other(4, Some("#0000ff"))];
        let cell = describe_cell(TileKind::Floor, None, &occupants, "#fff", no_colors);
        assert_eq!(
            cell.players,
            Some(PlayerMarker {
                color: "#00ff00".to_string(),
                count: 3
            })
        );

        let cell = describe_cell(TileKind::Floor, None, &[other(2, None)], "#fff", no_colors);
        assert_eq!(cell.players.unwrap().color, PLAYER_FALLBACK_COLOR);
    }

    fn snapshot(value: serde_json::Value) -> MazeSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_tile_code_is_labelled_as_floor() {
        let snap = snapshot(json!({"maze": [[9]], "pos": {"x": 0, "y": 0}}));

        let RenderOutcome::Grid { cells, .. } = render(&snap, "#ff0000") else {
            panic!("expected a grid");
        };
        assert_eq!(cells[0][0].tile, TileKind::Floor);
        assert_eq!(cells[0][0].fill, FLOOR_FILL);
        assert_eq!(cells[0][0].label, "r0 c0 v0");
    }

    #[test]
    fn renders_rotated_grid_with_overlays() {
        let snap = snapshot(json!({
            "maze": [[0, 1, 0], [0, 3, 0], [2, 0, 0]],
            "claims": [[0, 0, 0], [0, 9, 0], [0, 0, 8]],
            "players": [
                {"id": 1, "pos": {"x": 0, "y": 0}},
                {"id": 2, "pos": {"x": 1, "y": 0}, "styles": {"color": "#00ff00"}},
                {"id": 8, "pos": {"x": 40, "y": 40}, "styles": {"color": "#ff00ff"}}
            ],
            "pos": {"x": 0, "y": 0},
            "id": 1
        }));

        let RenderOutcome::Grid { width, height, cells } = render(&snap, "#ff0000") else {
            panic!("expected a grid");
        };
        assert_eq!((width, height), (3, 3));

        // self tile stays at the center and is not tinted
        let center = &cells[1][1];
        assert_eq!(center.tile, TileKind::PlayerMarker);
        assert_eq!(center.fill, "#ff0000");
        assert_eq!(center.claim, None);

        // raw (0,1) wall -> rotated (1,0)
        assert_eq!(cells[1][0].tile, TileKind::Wall);
        // raw (2,0) out of bounds -> rotated (2,2)
        assert_eq!(cells[2][2].tile, TileKind::OutOfBounds);

        let east = &cells[0][1];
        assert_eq!(east.players.as_ref().map(|m| m.color.as_str()), Some("#00ff00"));
        assert_eq!(east.label, "r0 c1 v0 players:1");

        // raw (2,2) claimed by 8 -> rotated (0,2), tinted with 8's declared color
        let claimed = &cells[0][2];
        assert_eq!(claimed.claim.as_ref().map(|t| t.color.as_str()), Some("#ff00ff"));
        assert_eq!(claimed.label, "r0 c2 v0 claimed:8");
    }

    #[test]
    fn ragged_maze_renders_no_data() {
        let snap = snapshot(json!({"maze": [[0, 0, 0], [0, 0, 0, 0], [0, 0, 0]]}));
        assert_eq!(render(&snap, DEFAULT_SELF_COLOR), RenderOutcome::NoData);
    }

    #[test]
    fn missing_or_empty_maze_renders_no_data() {
        assert_eq!(render(&snapshot(json!({})), DEFAULT_SELF_COLOR), RenderOutcome::NoData);
        assert_eq!(
            render(&snapshot(json!({"maze": []})), DEFAULT_SELF_COLOR),
            RenderOutcome::NoData
        );
        assert_eq!(
            render(&snapshot(json!({"maze": [[]]})), DEFAULT_SELF_COLOR),
            RenderOutcome::NoData
        );
    }

    #[test]
    fn all_zero_claims_leave_cells_untinted() {
        let snap = snapshot(json!({
            "maze": [[1, 1], [0, 3]],
            "claims": [[0, 0], [0, 0]]
        }));
        let RenderOutcome::Grid { cells, .. } = render(&snap, DEFAULT_SELF_COLOR) else {
            panic!("expected a grid");
        };
        assert!(cells.iter().flatten().all(|cell| cell.claim.is_none()));
    }
}
