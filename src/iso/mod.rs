//! Isometric projection and the follow camera.
//!
//! Screen space here is the classic 2:1 diamond layout with +y pointing
//! down the screen. Conversion to Bevy's y-up world happens only at the
//! sprite sync boundary in `scene::render`.

use bevy::prelude::*;

use crate::shared::*;

/// Stateless grid/world ↔ screen transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjector {
    /// Half the screen width of one diamond (the world size of one cell).
    pub tile_size: f32,
}

impl Default for IsoProjector {
    fn default() -> Self {
        Self { tile_size: TILE_SIZE }
    }
}

impl IsoProjector {
    /// Top vertex of the cell's diamond.
    pub fn to_screen(&self, row: i32, col: i32) -> Vec2 {
        let t = self.tile_size;
        Vec2::new((col - row) as f32 * t, (col + row) as f32 * t / 2.0)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - world.y, (world.x + world.y) / 2.0)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.y + screen.x / 2.0, screen.y - screen.x / 2.0)
    }

    /// Cell under a screen point.
    pub fn to_grid(&self, screen: Vec2) -> Cell {
        let world = self.screen_to_world(screen);
        (
            (world.y / self.tile_size).floor() as i32,
            (world.x / self.tile_size).floor() as i32,
        )
    }

    /// Draw-order key: larger is nearer the viewer.
    pub fn depth(world: Vec2) -> f32 {
        (world.x + world.y) / 2.0
    }

    pub fn cell_depth(&self, row: i32, col: i32) -> f32 {
        (col + row) as f32 * self.tile_size / 2.0
    }
}

/// Screen-space offset that centres the tractor in the viewport.
/// Derived every frame, never stored between runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsoCamera {
    pub offset: Vec2,
    pub viewport: Vec2,
}

impl IsoCamera {
    pub fn follow(projector: &IsoProjector, target: Vec2, viewport: Vec2) -> Self {
        Self {
            offset: projector.world_to_screen(target) - viewport / 2.0,
            viewport,
        }
    }

    /// Projected screen point → viewport pixels.
    pub fn to_viewport(&self, screen: Vec2) -> Vec2 {
        screen - self.offset
    }

    pub fn to_screen(&self, viewport_px: Vec2) -> Vec2 {
        viewport_px + self.offset
    }

    /// Inside the viewport grown by `margin` on every side.
    pub fn sees(&self, screen: Vec2, margin: f32) -> bool {
        screen.x > self.offset.x - margin
            && screen.x < self.offset.x + self.viewport.x + margin
            && screen.y > self.offset.y - margin
            && screen.y < self.offset.y + self.viewport.y + margin
    }
}
