//! Terrain domain: coordinate noise, the tile grid, world generation.
//!
//! Pure data; no Bevy systems live here. The simulation owns the grid.

pub mod generate;
pub mod grid;
pub mod noise;

pub use grid::TerrainGrid;
pub use noise::noise;
