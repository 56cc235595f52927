//! The authoritative tile array.

use crate::shared::*;

use super::noise;

/// N×N terrain kinds plus the per-cell noise variant fixed at construction.
///
/// Corridor columns are laid as gravel when the grid is built and are
/// never written afterwards. Every accessor treats out-of-range
/// coordinates as absent rather than panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    size: i32,
    kinds: Vec<TerrainKind>,
    variants: Vec<u8>,
    wooded: Vec<bool>,
}

impl TerrainGrid {
    /// Plain grass field with the corridor already laid.
    pub fn new(size: i32) -> Self {
        let size = size.max(0);
        let len = (size * size) as usize;
        let mut grid = Self {
            size,
            kinds: vec![TerrainKind::Grass; len],
            variants: Vec::with_capacity(len),
            wooded: vec![false; len],
        };
        for row in 0..size {
            for col in 0..size {
                grid.variants.push(noise::variant(row, col));
            }
        }
        for row in 0..size {
            for col in 0..CORRIDOR_COLS.min(size) {
                let i = grid.index(row, col);
                grid.kinds[i] = TerrainKind::GravelRoad;
            }
        }
        grid
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && row < self.size && col >= 0 && col < self.size
    }

    fn index(&self, row: i32, col: i32) -> usize {
        (row * self.size + col) as usize
    }

    pub fn kind(&self, row: i32, col: i32) -> Option<TerrainKind> {
        self.in_bounds(row, col).then(|| self.kinds[self.index(row, col)])
    }

    pub fn variant(&self, row: i32, col: i32) -> Option<u8> {
        self.in_bounds(row, col).then(|| self.variants[self.index(row, col)])
    }

    pub fn is_wooded(&self, row: i32, col: i32) -> bool {
        self.in_bounds(row, col) && self.wooded[self.index(row, col)]
    }

    pub(crate) fn set_wooded(&mut self, row: i32, col: i32, wooded: bool) {
        if self.in_bounds(row, col) && !is_corridor(col) {
            let i = self.index(row, col);
            self.wooded[i] = wooded;
        }
    }

    /// Write a kind. Returns whether the cell actually changed.
    /// Out-of-range and corridor cells are left alone.
    pub fn set_kind(&mut self, row: i32, col: i32, kind: TerrainKind) -> bool {
        if !self.in_bounds(row, col) || is_corridor(col) {
            return false;
        }
        let i = self.index(row, col);
        if self.kinds[i] == kind {
            return false;
        }
        self.kinds[i] = kind;
        true
    }

    /// Any of the 8 surrounding cells holds `kind`.
    pub fn neighbor_has(&self, row: i32, col: i32, kind: TerrainKind) -> bool {
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                if self.kind(row + dr, col + dc) == Some(kind) {
                    return true;
                }
            }
        }
        false
    }

    /// Chebyshev distance to the nearest `kind` in the field, searched ring
    /// by ring up to `max_dist`. Corridor cells are not part of the field.
    pub fn distance_to(&self, row: i32, col: i32, kind: TerrainKind, max_dist: i32) -> Option<i32> {
        for d in 1..=max_dist {
            for dr in -d..=d {
                for dc in -d..=d {
                    if is_corridor(col + dc) {
                        continue;
                    }
                    if self.kind(row + dr, col + dc) == Some(kind) {
                        return Some(d);
                    }
                }
            }
        }
        None
    }

    fn should_shoulder(&self, row: i32, col: i32, radius: i32) -> bool {
        matches!(
            self.kind(row, col),
            Some(TerrainKind::Grass) | Some(TerrainKind::Dirt)
        ) && self.distance_to(row, col, TerrainKind::GravelRoad, radius) == Some(1)
    }

    /// Turn grass or dirt touching gravel into light dirt. Returns how many
    /// cells changed.
    pub fn classify_boundaries(&mut self, radius: i32) -> usize {
        let mut changed = 0;
        for row in 0..self.size {
            for col in CORRIDOR_COLS.min(self.size)..self.size {
                if self.should_shoulder(row, col, radius)
                    && self.set_kind(row, col, TerrainKind::LightDirt)
                {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Lay gravel at one cell and re-derive the shoulder around it.
    /// Returns every cell that changed with its new kind.
    pub fn paint_road(&mut self, row: i32, col: i32) -> Vec<(Cell, TerrainKind)> {
        let mut changes = Vec::new();
        if !self.set_kind(row, col, TerrainKind::GravelRoad) {
            return changes;
        }
        changes.push(((row, col), TerrainKind::GravelRoad));
        for dr in -1..=1 {
            for dc in -1..=1 {
                let (r, c) = (row + dr, col + dc);
                if self.should_shoulder(r, c, 1) && self.set_kind(r, c, TerrainKind::LightDirt) {
                    changes.push(((r, c), TerrainKind::LightDirt));
                }
            }
        }
        changes
    }

    pub fn count(&self, kind: TerrainKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }

    /// One row of kinds, `None` when out of range.
    pub fn row(&self, row: i32) -> Option<&[TerrainKind]> {
        if row < 0 || row >= self.size {
            return None;
        }
        let start = self.index(row, 0);
        Some(&self.kinds[start..start + self.size as usize])
    }
}
