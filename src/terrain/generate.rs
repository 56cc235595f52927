//! World generation: forest flags, the access road, the shed courtyard.

use bevy::prelude::*;

use crate::shared::*;

use super::{noise, TerrainGrid};

/// Wooded when the cell's noise exceeds this.
pub const FOREST_THRESHOLD: f32 = 0.60;

const ROAD_HALF_WIDTH: i32 = 6;
const ROAD_WAVE_FREQ: f64 = 0.15;
const ROAD_WAVE_AMPLITUDE: f64 = 5.0;

const COURTYARD_RADIUS: f64 = 18.0;

/// Leftmost road column.
pub fn road_start_col() -> i32 {
    CORRIDOR_COLS
}

/// Last road column; the road runs a few cells past the shed's centre line.
pub fn road_end_col(shed: &Structure) -> i32 {
    shed.col + shed.width / 2 + 4
}

/// Centre row of the road before the sine offset.
pub fn road_centre_row(shed: &Structure) -> i32 {
    shed.row + shed.height + 3
}

fn road_row_offset(col: i32) -> i32 {
    (((col - road_start_col()) as f64 * ROAD_WAVE_FREQ).sin() * ROAD_WAVE_AMPLITUDE) as i32
}

fn courtyard_contains(centre: Cell, row: i32, col: i32) -> bool {
    let dx = (col - centre.1) as f64;
    let dy = (row - centre.0) as f64;
    let theta = dy.atan2(dx);
    let edge = COURTYARD_RADIUS + (theta * 5.0).sin() * 2.5 + (theta * 3.0).cos() * 2.0;
    (dx * dx + dy * dy).sqrt() < edge
}

impl TerrainGrid {
    /// Build the full starting field. Deterministic for a given size.
    pub fn generate(size: i32, shed: &Structure) -> Self {
        let mut grid = TerrainGrid::new(size);

        let mut forest = 0;
        for row in 0..size {
            for col in CORRIDOR_COLS.min(size)..size {
                if noise::noise(row, col) > FOREST_THRESHOLD {
                    grid.set_wooded(row, col, true);
                    forest += 1;
                }
            }
        }

        let centre_row = road_centre_row(shed);
        for col in road_start_col()..=road_end_col(shed) {
            let base = centre_row + road_row_offset(col);
            for w in -ROAD_HALF_WIDTH..=ROAD_HALF_WIDTH {
                grid.set_kind(base + w, col, TerrainKind::GravelRoad);
            }
        }

        let centre = shed.centre_cell();
        let reach = COURTYARD_RADIUS as i32;
        for row in centre.0 - reach - 5..centre.0 + reach + 10 {
            for col in centre.1 - reach - 10..centre.1 + reach + 10 {
                if courtyard_contains(centre, row, col) {
                    grid.set_kind(row, col, TerrainKind::GravelRoad);
                }
            }
        }

        let shoulder = grid.classify_boundaries(2);

        info!(
            "Generated {size}x{size} field: {} gravel, {} shoulder, {} wooded cells",
            grid.count(TerrainKind::GravelRoad),
            shoulder,
            forest
        );
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = TerrainGrid::generate(MAP_SIZE, &SHED);
        let b = TerrainGrid::generate(MAP_SIZE, &SHED);
        assert_eq!(a, b);
    }

    #[test]
    fn road_runs_from_corridor_to_shed() {
        let grid = TerrainGrid::generate(MAP_SIZE, &SHED);
        let centre_row = road_centre_row(&SHED);
        assert_eq!(centre_row, 71);
        assert_eq!(road_end_col(&SHED), 67);

        // Column 12 has zero offset, so the road is centred on row 71 there.
        for w in -6..=6 {
            assert_eq!(
                grid.kind(71 + w, 12),
                Some(TerrainKind::GravelRoad),
                "road missing at row {}",
                71 + w
            );
        }
        // At column 30 the wave pushes the road down to rows 67..=79.
        assert_eq!(grid.kind(79, 30), Some(TerrainKind::GravelRoad));
        assert_eq!(grid.kind(80, 30), Some(TerrainKind::LightDirt));
        assert_eq!(grid.kind(81, 30), Some(TerrainKind::Grass));
    }

    #[test]
    fn courtyard_surrounds_the_shed() {
        let grid = TerrainGrid::generate(MAP_SIZE, &SHED);
        let (row, col) = SHED.centre_cell();
        assert_eq!((row, col), (64, 63));
        for (dr, dc) in [(0, 0), (10, 0), (0, -10), (-10, 5)] {
            assert_eq!(
                grid.kind(row + dr, col + dc),
                Some(TerrainKind::GravelRoad),
                "courtyard missing at offset ({dr}, {dc})"
            );
        }
        // Far outside the deformed circle.
        assert_ne!(grid.kind(row - 30, col + 30), Some(TerrainKind::GravelRoad));
    }

    #[test]
    fn every_shoulder_cell_touches_gravel() {
        let grid = TerrainGrid::generate(MAP_SIZE, &SHED);
        for row in 0..MAP_SIZE {
            for col in 0..MAP_SIZE {
                if grid.kind(row, col) == Some(TerrainKind::LightDirt) {
                    assert!(
                        grid.neighbor_has(row, col, TerrainKind::GravelRoad),
                        "shoulder at ({row}, {col}) has no gravel neighbour"
                    );
                }
            }
        }
    }

    #[test]
    fn corridor_is_never_wooded() {
        let grid = TerrainGrid::generate(MAP_SIZE, &SHED);
        for row in 0..MAP_SIZE {
            for col in 0..CORRIDOR_COLS {
                assert!(!grid.is_wooded(row, col));
            }
        }
        assert!((0..MAP_SIZE).any(|r| (CORRIDOR_COLS..MAP_SIZE).any(|c| grid.is_wooded(r, c))));
    }
}
