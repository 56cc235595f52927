//! Minimap overlay buffer: one RGBA pixel per grid cell.

use crate::shared::*;
use crate::terrain::TerrainGrid;

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];
pub const ROAD_COLOUR: Rgba = [0x6a, 0x5d, 0x4d, 0xff];
pub const DIRT_COLOUR: Rgba = [0x5d, 0x3a, 0x1a, 0xff];
pub const PLANTED_COLOUR: Rgba = [0x44, 0xaa, 0x44, 0xff];
pub const WOODLAND_TINT: Rgba = [0x1f, 0x3b, 0x17, 0x90];

/// Colour the minimap shows for a cell, or transparent for untouched ground.
pub fn cell_colour(kind: TerrainKind, wooded: bool) -> Rgba {
    match kind {
        TerrainKind::GravelRoad => ROAD_COLOUR,
        TerrainKind::Dirt => DIRT_COLOUR,
        TerrainKind::Planted => PLANTED_COLOUR,
        TerrainKind::Grass | TerrainKind::LightDirt if wooded => WOODLAND_TINT,
        TerrainKind::Grass | TerrainKind::LightDirt => TRANSPARENT,
    }
}

/// Written through on every tile change so it never has to be rebuilt
/// during play.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapOverlay {
    size: i32,
    pixels: Vec<u8>,
}

impl MinimapOverlay {
    pub fn from_grid(grid: &TerrainGrid) -> Self {
        let size = grid.size();
        let mut overlay = Self {
            size,
            pixels: vec![0; (size * size * 4) as usize],
        };
        overlay.rebuild(grid);
        overlay
    }

    pub fn rebuild(&mut self, grid: &TerrainGrid) {
        for row in 0..self.size {
            for col in 0..self.size {
                if let Some(kind) = grid.kind(row, col) {
                    self.write(row, col, cell_colour(kind, grid.is_wooded(row, col)));
                }
            }
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    fn offset(&self, row: i32, col: i32) -> Option<usize> {
        (row >= 0 && row < self.size && col >= 0 && col < self.size)
            .then(|| ((row * self.size + col) * 4) as usize)
    }

    pub fn write(&mut self, row: i32, col: i32, colour: Rgba) {
        if let Some(at) = self.offset(row, col) {
            self.pixels[at..at + 4].copy_from_slice(&colour);
        }
    }

    pub fn pixel(&self, row: i32, col: i32) -> Option<Rgba> {
        let at = self.offset(row, col)?;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[at..at + 4]);
        Some(out)
    }
}
