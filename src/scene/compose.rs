//! Scene composition: which images go where, in what order.
//!
//! `compose` is a pure function of the simulation state. It yields a flat
//! list of draw items in viewport pixels (top-left origin, y down), already
//! sorted back to front. The Bevy side only maps the list onto sprites.

use bevy::prelude::*;

use crate::iso::{IsoCamera, IsoProjector};
use crate::shared::*;
use crate::sim::SimulationState;
use crate::terrain::{noise, TerrainGrid};

use super::atlas::{TileImage, TILE_IMAGE_TOP};

/// Out-of-grid cells grow a tree above this noise.
pub const TREE_THRESHOLD: f32 = 0.58;
pub const TREE_SHEET_COLUMNS: usize = 4;
pub const TREE_SHEET_ROWS: usize = 2;
pub const TREE_FRAME_SIZE: Vec2 = Vec2::new(104.0, 270.5);
pub const TREE_SCALE: f32 = 0.38;

pub const TRACTOR_FRAME_SIZE: Vec2 = Vec2::new(931.0 / 6.0, 472.0 / 4.0);
pub const TRACTOR_SCALE: f32 = 0.4;

/// Implement bar, before rotation.
pub const IMPLEMENT_SIZE: Vec2 = Vec2::new(12.0, 90.0);
/// Screen-space turn applied on top of the implement heading.
const IMPLEMENT_ROTATION_OFFSET: f32 = 45.0;
/// Distance ahead of the implement origin where the hitch bar attaches.
const HITCH_FRONT: f32 = 5.0;
/// Height of the tractor's drawbar above its foot point.
const HITCH_LIFT: f32 = 10.0;

/// Painted lines along the corridor, by column position.
pub const ROAD_LINES: [(f32, LinePaint, f32); 3] = [
    (5.8, LinePaint::Yellow, 2.0),
    (6.2, LinePaint::Yellow, 2.0),
    (2.2, LinePaint::White, 1.5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePaint {
    Yellow,
    White,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    /// Top-left corner of a tile image.
    Tile { image: TileImage, at: Vec2 },
    RoadLine {
        from: Vec2,
        to: Vec2,
        width: f32,
        paint: LinePaint,
    },
    /// Tree drawn with its foot (bottom centre) at `foot`.
    Tree { frame: usize, foot: Vec2, depth: f32 },
    /// Structure drawn with its bottom centre at `base`.
    Structure { base: Vec2, width: f32 },
    HitchBar { from: Vec2, to: Vec2 },
    Implement {
        centre: Vec2,
        rotation_deg: f32,
        tool: Tool,
    },
    Tractor { foot: Vec2, frame: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub camera: IsoCamera,
    pub items: Vec<SceneItem>,
}

/// Tile image for any cell, inside the grid or not.
pub fn select_tile(grid: &TerrainGrid, row: i32, col: i32) -> TileImage {
    if is_corridor(col) {
        return if col < 2 || col >= CORRIDOR_COLS - 2 {
            TileImage::RoadBorder
        } else {
            TileImage::Road
        };
    }
    let (Some(kind), Some(variant)) = (grid.kind(row, col), grid.variant(row, col)) else {
        return TileImage::DarkGrass(noise::variant(row, col));
    };
    if kind == TerrainKind::GravelRoad {
        return TileImage::Gravel(variant % GRAVEL_VARIANT_COUNT as u8);
    }
    let size = grid.size();
    let near_edge = col < CORRIDOR_COLS + EDGE_MARGIN
        || col >= size - EDGE_MARGIN
        || row < EDGE_MARGIN
        || row >= size - EDGE_MARGIN;
    if near_edge {
        return TileImage::DarkGrass(variant);
    }
    match kind {
        TerrainKind::Planted => TileImage::Seedling(variant),
        TerrainKind::Dirt if variant > 35 => TileImage::PebbledPlowed(variant),
        TerrainKind::LightDirt if variant > 30 => TileImage::PebbledPlowed(variant),
        TerrainKind::Dirt | TerrainKind::LightDirt => TileImage::Plowed,
        TerrainKind::Grass | TerrainKind::GravelRoad => TileImage::Grass(variant),
    }
}

/// Translucent washes drawn over a shoulder cell.
pub fn select_overlays(grid: &TerrainGrid, row: i32, col: i32) -> Vec<TileImage> {
    let mut out = Vec::new();
    if grid.kind(row, col) != Some(TerrainKind::LightDirt) {
        return out;
    }
    if grid.neighbor_has(row, col, TerrainKind::GravelRoad) {
        let seed = grid.variant(row, col).unwrap_or(0) as f32 / 63.0;
        out.push(if seed > 0.6 {
            TileImage::GravelBlendSpeck
        } else {
            TileImage::GravelBlend
        });
    }
    if grid.neighbor_has(row, col, TerrainKind::Grass) {
        out.push(TileImage::GrassBlend);
    }
    out
}

/// Out-of-grid ring outside the corridor.
fn is_forest_ring(grid: &TerrainGrid, row: i32, col: i32) -> bool {
    !is_corridor(col) && !grid.in_bounds(row, col)
}

pub fn tree_frame(row: i32, col: i32) -> usize {
    ((row.wrapping_mul(13).wrapping_add(col.wrapping_mul(7))) % 8).unsigned_abs() as usize
}

struct TreeSpot {
    item: SceneItem,
    depth: f32,
}

pub fn compose(sim: &SimulationState) -> SceneFrame {
    let iso = &sim.projector;
    let camera = sim.camera();
    let view = &sim.config.view;
    let t = iso.tile_size;
    let (centre_row, centre_col) = sim.tractor.cell();
    let rad = view.scene_radius;
    let tractor_depth = IsoProjector::depth(sim.tractor.position);

    let mut items = Vec::new();
    let mut trees = Vec::new();

    // (1) ground
    for row in centre_row - rad..=centre_row + rad {
        for col in centre_col - rad..=centre_col + rad {
            let top = iso.to_screen(row, col);
            if !camera.sees(top, view.cull_margin) {
                continue;
            }
            let at = camera.to_viewport(top - Vec2::new(t, TILE_IMAGE_TOP)).floor();
            items.push(SceneItem::Tile {
                image: select_tile(&sim.grid, row, col),
                at,
            });
            for image in select_overlays(&sim.grid, row, col) {
                items.push(SceneItem::Tile { image, at });
            }

            if is_forest_ring(&sim.grid, row, col) {
                let n = noise(row, col);
                if n > TREE_THRESHOLD {
                    let offset = Vec2::new(n * 8.0 - 4.0, (row as f32 * 0.5).sin() * 3.0);
                    let depth = iso.cell_depth(row, col);
                    trees.push(TreeSpot {
                        item: SceneItem::Tree {
                            frame: tree_frame(row, col),
                            foot: camera.to_viewport(top + offset + Vec2::new(0.0, 5.0)),
                            depth,
                        },
                        depth,
                    });
                }
            }
        }
    }

    let row_span = (rad + 1) as f32;
    for (col_pos, paint, width) in ROAD_LINES {
        let from = Vec2::new(col_pos * t, centre_row as f32 * t - row_span * t);
        let to = Vec2::new(col_pos * t, centre_row as f32 * t + row_span * t);
        let lift = Vec2::new(0.0, t / 2.0);
        items.push(SceneItem::RoadLine {
            from: camera.to_viewport(iso.world_to_screen(from) + lift),
            to: camera.to_viewport(iso.world_to_screen(to) + lift),
            width,
            paint,
        });
    }

    // (2) scenery behind the tractor
    let (behind, in_front): (Vec<_>, Vec<_>) =
        trees.into_iter().partition(|spot| spot.depth <= tractor_depth);
    items.extend(behind.into_iter().map(|spot| spot.item));

    // (3) implement
    let trailer = &sim.trailer;
    let tractor_screen = iso.world_to_screen(sim.tractor.position);
    if trailer.attached {
        let heading = trailer.angle.to_radians();
        let front = trailer.position + Vec2::new(heading.cos(), heading.sin()) * HITCH_FRONT;
        items.push(SceneItem::HitchBar {
            from: camera.to_viewport(tractor_screen - Vec2::new(0.0, HITCH_LIFT)),
            to: camera.to_viewport(iso.world_to_screen(front)),
        });
    }
    items.push(SceneItem::Implement {
        centre: camera.to_viewport(iso.world_to_screen(trailer.position)),
        rotation_deg: trailer.angle + IMPLEMENT_ROTATION_OFFSET,
        tool: sim.tool,
    });

    // (4)-(6) structure around the tractor
    let structure = structure_item(sim, &camera);
    let structure_behind = sim.structure.base_depth() <= tractor_depth;
    if structure_behind {
        items.push(structure.clone());
    }
    items.push(SceneItem::Tractor {
        foot: camera.to_viewport(tractor_screen),
        frame: sim.tractor.sprite_frame(),
    });
    if !structure_behind {
        items.push(structure);
    }

    // (7) scenery in front
    items.extend(in_front.into_iter().map(|spot| spot.item));

    SceneFrame { camera, items }
}

fn structure_item(sim: &SimulationState, camera: &IsoCamera) -> SceneItem {
    let s = &sim.structure;
    let iso = &sim.projector;
    let near_left = iso.to_screen(s.row, s.col);
    let far_right = iso.to_screen(s.row + s.height, s.col + s.width);
    let base = Vec2::new((near_left.x + far_right.x) / 2.0, far_right.y);
    SceneItem::Structure {
        base: camera.to_viewport(base),
        width: (s.width + s.height) as f32 * iso.tile_size * 0.75,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FarmConfig;
    use crate::vehicle::VehicleBody;

    fn index_of(frame: &SceneFrame, pred: impl Fn(&SceneItem) -> bool) -> Option<usize> {
        frame.items.iter().position(pred)
    }

    #[test]
    fn corridor_precedence() {
        let grid = TerrainGrid::new(MAP_SIZE);
        assert_eq!(select_tile(&grid, 50, 0), TileImage::RoadBorder);
        assert_eq!(select_tile(&grid, 50, 1), TileImage::RoadBorder);
        assert_eq!(select_tile(&grid, 50, 5), TileImage::Road);
        assert_eq!(select_tile(&grid, 50, 10), TileImage::RoadBorder);
        assert_eq!(select_tile(&grid, -20, 6), TileImage::Road, "corridor runs past the grid");
    }

    #[test]
    fn in_grid_precedence() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let v = |g: &TerrainGrid, r, c| g.variant(r, c).unwrap_or(0);

        grid.set_kind(3, 50, TerrainKind::GravelRoad);
        assert_eq!(select_tile(&grid, 3, 50), TileImage::Gravel(v(&grid, 3, 50) % 16));

        grid.set_kind(100, 14, TerrainKind::Dirt);
        assert_eq!(select_tile(&grid, 100, 14), TileImage::DarkGrass(v(&grid, 100, 14)));
        assert_eq!(select_tile(&grid, 197, 100), TileImage::DarkGrass(v(&grid, 197, 100)));

        grid.set_kind(100, 100, TerrainKind::Planted);
        assert_eq!(select_tile(&grid, 100, 100), TileImage::Seedling(v(&grid, 100, 100)));

        assert_eq!(select_tile(&grid, 120, 120), TileImage::Grass(v(&grid, 120, 120)));
        assert_eq!(
            select_tile(&grid, -4, 300),
            TileImage::DarkGrass(noise::variant(-4, 300))
        );
    }

    #[test]
    fn plowed_tiles_pick_pebbles_by_variant() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut seen_plain = false;
        let mut seen_pebbled = false;
        for col in 40..80 {
            grid.set_kind(100, col, TerrainKind::Dirt);
            let v = grid.variant(100, col).unwrap_or(0);
            match select_tile(&grid, 100, col) {
                TileImage::Plowed => {
                    assert!(v <= 35);
                    seen_plain = true;
                }
                TileImage::PebbledPlowed(p) => {
                    assert!(v > 35);
                    assert_eq!(p, v);
                    seen_pebbled = true;
                }
                other => panic!("unexpected {other:?} for dirt"),
            }
        }
        assert!(seen_plain && seen_pebbled);
    }

    #[test]
    fn shoulder_overlays() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        grid.set_kind(100, 100, TerrainKind::GravelRoad);
        grid.classify_boundaries(2);
        let overlays = select_overlays(&grid, 100, 101);
        assert_eq!(overlays.len(), 2, "beside both gravel and grass: {overlays:?}");
        assert_eq!(overlays.last(), Some(&TileImage::GrassBlend));
        assert!(select_overlays(&grid, 120, 120).is_empty());
    }

    #[test]
    fn ground_comes_first() {
        let sim = SimulationState::new(FarmConfig::default());
        let frame = compose(&sim);
        let first_other = index_of(&frame, |i| {
            !matches!(i, SceneItem::Tile { .. } | SceneItem::RoadLine { .. })
        })
        .expect("vehicles are always drawn");
        assert!(frame.items[first_other..]
            .iter()
            .all(|i| !matches!(i, SceneItem::Tile { .. } | SceneItem::RoadLine { .. })));
    }

    #[test]
    fn structure_sorts_against_the_tractor() {
        let mut sim = SimulationState::new(FarmConfig::default());
        let base = sim.structure.base_depth();

        // In front of the structure's base: structure drawn first.
        sim.tractor = VehicleBody::new(Vec2::new(base + 50.0, base + 50.0), 0.0);
        let frame = compose(&sim);
        let s = index_of(&frame, |i| matches!(i, SceneItem::Structure { .. }));
        let t = index_of(&frame, |i| matches!(i, SceneItem::Tractor { .. }));
        assert!(s < t);

        // Behind it: structure drawn over the tractor.
        sim.tractor = VehicleBody::new(Vec2::new(base - 200.0, base - 200.0), 0.0);
        let frame = compose(&sim);
        let s = index_of(&frame, |i| matches!(i, SceneItem::Structure { .. }));
        let t = index_of(&frame, |i| matches!(i, SceneItem::Tractor { .. }));
        assert!(s > t);
    }

    #[test]
    fn trees_split_around_the_tractor() {
        let mut sim = SimulationState::new(FarmConfig::default());
        let edge = (MAP_SIZE - 1) as f32 * TILE_SIZE;
        sim.tractor = VehicleBody::new(Vec2::new(edge, edge), 0.0);
        let frame = compose(&sim);
        let tractor_depth = IsoProjector::depth(sim.tractor.position);
        let tractor_at = index_of(&frame, |i| matches!(i, SceneItem::Tractor { .. }))
            .expect("tractor drawn");

        let mut trees = 0;
        for (i, item) in frame.items.iter().enumerate() {
            if let SceneItem::Tree { depth, frame, .. } = item {
                trees += 1;
                assert!(*frame < TREE_SHEET_COLUMNS * TREE_SHEET_ROWS);
                if i < tractor_at {
                    assert!(*depth <= tractor_depth);
                } else {
                    assert!(*depth > tractor_depth);
                }
            }
        }
        assert!(trees > 0, "the forest ring should be in view from the corner");
    }

    #[test]
    fn hitch_bar_only_while_coupled() {
        let mut sim = SimulationState::new(FarmConfig::default());
        let has_bar = |f: &SceneFrame| f.items.iter().any(|i| matches!(i, SceneItem::HitchBar { .. }));
        assert!(!has_bar(&compose(&sim)));
        sim.trailer.attached = true;
        assert!(has_bar(&compose(&sim)));
    }

    #[test]
    fn tractor_is_centred() {
        let sim = SimulationState::new(FarmConfig::default());
        let frame = compose(&sim);
        let foot = frame.items.iter().find_map(|i| match i {
            SceneItem::Tractor { foot, .. } => Some(*foot),
            _ => None,
        });
        assert_eq!(foot, Some(sim.viewport / 2.0));
    }

    #[test]
    fn tree_frames_handle_negative_cells() {
        assert_eq!(tree_frame(0, 0), 0);
        assert_eq!(tree_frame(-1, 0), 5);
        assert!(tree_frame(-37, -91) < 8);
    }
}
