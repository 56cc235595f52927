//! Scene domain: procedural tile art, isometric composition, and the
//! sprite pool that puts it on screen.

pub mod atlas;
pub mod compose;
pub mod render;

use bevy::prelude::*;

use crate::shared::*;

pub use atlas::{TileAtlas, TileImage};
pub use compose::{compose, SceneFrame, SceneItem};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<render::ScenePool>()
            .add_systems(Startup, render::setup_camera)
            .add_systems(
                OnEnter(GameState::Loading),
                (atlas::build_tile_atlas, render::load_scene_assets),
            )
            .add_systems(
                Update,
                (
                    render::track_viewport,
                    render::report_missing_assets,
                )
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                render::sync_scene.run_if(in_state(GameState::Playing)),
            );
    }
}
