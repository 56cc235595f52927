use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::shared::*;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControlInput>()
            .init_resource::<KeyBindings>()
            .add_systems(PreUpdate, reset_and_read_input);
    }
}

/// The single point where hardware input becomes driving controls.
fn reset_and_read_input(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    bindings: Res<KeyBindings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut input: ResMut<ControlInput>,
) {
    *input = ControlInput::default();

    for (control, key, alt) in [
        (Control::Forward, bindings.forward, KeyCode::ArrowUp),
        (Control::Backward, bindings.backward, KeyCode::ArrowDown),
        (Control::TurnLeft, bindings.turn_left, KeyCode::ArrowLeft),
        (Control::TurnRight, bindings.turn_right, KeyCode::ArrowRight),
    ] {
        if keys.pressed(key) || keys.pressed(alt) {
            input.held.insert(control);
        }
    }

    input.toggle_tool = keys.just_pressed(bindings.toggle_tool);
    input.toggle_hitch = keys.just_pressed(bindings.toggle_hitch);
    input.export = keys.just_pressed(bindings.export);
    input.import = keys.just_pressed(bindings.import);

    // Window coordinates are top-left origin, which is what the view uses.
    let cursor = windows.get_single().ok().and_then(|w| w.cursor_position());
    if mouse.just_pressed(MouseButton::Left) {
        input.click = cursor;
    }
    if mouse.just_pressed(MouseButton::Right) {
        input.paint_click = cursor;
    }
}
