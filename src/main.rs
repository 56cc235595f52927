use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use furrow::shared::*;
use furrow::{config, input, save, scene, sim, ui};

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Furrow".into(),
                        resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        // Game state
        .init_state::<GameState>()
        // Domain plugins
        .add_plugins(config::ConfigPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(sim::SimulationPlugin)
        .add_plugins(scene::ScenePlugin)
        .add_plugins(ui::UiPlugin)
        .add_plugins(save::SavePlugin)
        .run();
}
