mod hud;
pub mod minimap;
mod toast;

use bevy::prelude::*;

use crate::shared::*;

pub use hud::{status_line, Speedometer};
pub use minimap::{render_minimap, MinimapView};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MinimapView>()
            .add_event::<SnapshotCompleteEvent>();

        // ─── HUD, visible during Playing state ───
        app.add_systems(
            OnEnter(GameState::Playing),
            (
                hud::spawn_hud,
                minimap::spawn_minimap,
                toast::spawn_toast_container,
            ),
        );
        app.add_systems(
            OnExit(GameState::Playing),
            (
                hud::despawn_hud,
                minimap::despawn_minimap,
                toast::despawn_toast_container,
            ),
        );
        app.add_systems(
            Update,
            (
                hud::update_hud,
                (minimap::handle_zoom_clicks, minimap::update_minimap).chain(),
                toast::handle_snapshot_toasts,
                toast::update_toasts,
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}
