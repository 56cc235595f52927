//! Plow and planter footprint stamping.

use bevy::prelude::*;

use crate::shared::*;
use crate::terrain::TerrainGrid;

use super::overlay::{cell_colour, MinimapOverlay};

/// What `tool` turns `kind` into, if anything.
///
/// Plow: grass → dirt. Planter: dirt → planted. Everything else, including
/// the road and its shoulder, is left as is.
pub fn transition(kind: TerrainKind, tool: Tool) -> Option<TerrainKind> {
    match (kind, tool) {
        (TerrainKind::Grass, Tool::Plow) => Some(TerrainKind::Dirt),
        (TerrainKind::Dirt, Tool::Planter) => Some(TerrainKind::Planted),
        (TerrainKind::Grass, Tool::Planter)
        | (TerrainKind::Dirt, Tool::Plow)
        | (TerrainKind::Planted, _)
        | (TerrainKind::GravelRoad, _)
        | (TerrainKind::LightDirt, _) => None,
    }
}

/// Cells an implement is allowed to work: clear of the map edge margin and
/// of the corridor plus its margin.
pub fn playable(row: i32, col: i32, size: i32) -> bool {
    row >= EDGE_MARGIN
        && row < size - EDGE_MARGIN
        && col >= CORRIDOR_COLS + EDGE_MARGIN
        && col < size - EDGE_MARGIN
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmEditor {
    pub radius: i32,
    last_cell: Option<Cell>,
}

impl Default for FarmEditor {
    fn default() -> Self {
        Self::new(3)
    }
}

impl FarmEditor {
    pub fn new(radius: i32) -> Self {
        Self {
            radius: radius.max(0),
            last_cell: None,
        }
    }

    pub fn last_cell(&self) -> Option<Cell> {
        self.last_cell
    }

    /// Work the square footprint centred on `centre`, but only the first
    /// time the implement enters that cell. Returns the cells that changed.
    pub fn stamp(
        &mut self,
        grid: &mut TerrainGrid,
        overlay: &mut MinimapOverlay,
        centre: Cell,
        tool: Tool,
    ) -> Vec<(Cell, TerrainKind)> {
        if self.last_cell == Some(centre) {
            return Vec::new();
        }
        self.last_cell = Some(centre);

        let mut changed = Vec::new();
        let r = self.radius;
        for dr in -r..=r {
            for dc in -r..=r {
                let (row, col) = (centre.0 + dr, centre.1 + dc);
                if !playable(row, col, grid.size()) {
                    continue;
                }
                let Some(kind) = grid.kind(row, col) else {
                    continue;
                };
                let Some(next) = transition(kind, tool) else {
                    continue;
                };
                if grid.set_kind(row, col, next) {
                    overlay.write(row, col, cell_colour(next, grid.is_wooded(row, col)));
                    changed.push(((row, col), next));
                }
            }
        }

        debug!(
            "{} stamp at ({}, {}): {} cells changed",
            tool.label(),
            centre.0,
            centre.1,
            changed.len()
        );
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farming::overlay::PLANTED_COLOUR;

    #[test]
    fn transition_table_is_exhaustive_and_safe() {
        for kind in TerrainKind::ALL {
            for tool in [Tool::Plow, Tool::Planter] {
                let next = transition(kind, tool);
                if let Some(next) = next {
                    assert!(!next.is_protected(), "{kind:?} + {tool:?} produced protected {next:?}");
                    assert!(!kind.is_protected(), "{kind:?} should never transition");
                }
                if next == Some(TerrainKind::Planted) {
                    assert_eq!(kind, TerrainKind::Dirt, "planted only from dirt");
                }
            }
        }
        assert_eq!(transition(TerrainKind::Grass, Tool::Plow), Some(TerrainKind::Dirt));
        assert_eq!(transition(TerrainKind::Dirt, Tool::Planter), Some(TerrainKind::Planted));
        assert_eq!(transition(TerrainKind::Grass, Tool::Planter), None);
    }

    #[test]
    fn footprint_is_seven_by_seven() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::default();
        let changed = editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);
        assert_eq!(changed.len(), 49);
        assert_eq!(grid.kind(97, 103), Some(TerrainKind::Dirt));
        assert_eq!(grid.kind(96, 100), Some(TerrainKind::Grass));
        assert_eq!(overlay.pixel(100, 100), Some(cell_colour(TerrainKind::Dirt, grid.is_wooded(100, 100))));
    }

    #[test]
    fn same_cell_is_not_restamped() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::default();
        editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);
        let again = editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Planter);
        assert!(again.is_empty(), "debounced while the cell is unchanged");
        assert_eq!(grid.kind(100, 100), Some(TerrainKind::Dirt));
    }

    #[test]
    fn stamping_is_idempotent() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::default();
        editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);

        // Move away and back: the second pass finds nothing left to plow.
        editor.stamp(&mut grid, &mut overlay, (150, 150), Tool::Plow);
        let before = grid.clone();
        let changed = editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);
        assert!(changed.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn road_and_shoulder_are_protected() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        grid.set_kind(100, 100, TerrainKind::GravelRoad);
        grid.classify_boundaries(2);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::default();
        editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);
        assert_eq!(grid.kind(100, 100), Some(TerrainKind::GravelRoad));
        assert_eq!(grid.kind(101, 101), Some(TerrainKind::LightDirt));
        assert_eq!(grid.kind(102, 102), Some(TerrainKind::Dirt));
    }

    #[test]
    fn footprint_is_clipped_to_the_playable_area() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::default();
        let changed = editor.stamp(&mut grid, &mut overlay, (6, 18), Tool::Plow);
        // Rows 5..=9, cols 17..=21.
        assert_eq!(changed.len(), 25);
        assert_eq!(grid.kind(4, 18), Some(TerrainKind::Grass));
        assert_eq!(grid.kind(6, 16), Some(TerrainKind::Grass));

        let off_map = editor.stamp(&mut grid, &mut overlay, (-40, -40), Tool::Plow);
        assert!(off_map.is_empty());
    }

    #[test]
    fn planter_only_works_plowed_ground() {
        let mut grid = TerrainGrid::new(MAP_SIZE);
        let mut overlay = MinimapOverlay::from_grid(&grid);
        let mut editor = FarmEditor::new(1);
        editor.stamp(&mut grid, &mut overlay, (100, 100), Tool::Plow);
        let planted = editor.stamp(&mut grid, &mut overlay, (100, 101), Tool::Planter);
        // Columns 99..=101 were plowed; column 102 is still grass.
        assert_eq!(planted.len(), 6);
        assert_eq!(grid.kind(100, 102), Some(TerrainKind::Grass));
        assert_eq!(grid.kind(100, 101), Some(TerrainKind::Planted));
        assert_eq!(overlay.pixel(100, 101), Some(PLANTED_COLOUR));
    }
}
