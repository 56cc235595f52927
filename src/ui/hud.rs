//! HUD: speedometer and implement status as a text readout in the
//! bottom-left corner.

use bevy::prelude::*;

use crate::config::VehicleSettings;
use crate::shared::*;
use crate::sim::SimulationState;
use crate::vehicle::VehicleBody;

// ═══════════════════════════════════════════════════════════════════════
// SPEEDOMETER
// ═══════════════════════════════════════════════════════════════════════

/// Gauge reading for the current tractor speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speedometer {
    pub kmh: f32,
    /// -180 at rest, 0 at full speed.
    pub needle_deg: f32,
}

impl Speedometer {
    pub fn read(body: &VehicleBody, settings: &VehicleSettings) -> Self {
        let fraction = if settings.max_speed > 0.0 {
            (body.speed.abs() / settings.max_speed).min(1.0)
        } else {
            0.0
        };
        Self {
            kmh: body.speed_kmh(settings),
            needle_deg: -180.0 + 180.0 * fraction,
        }
    }
}

/// The full status line shown under the gauge.
pub fn status_line(sim: &SimulationState) -> String {
    let gauge = Speedometer::read(&sim.tractor, &sim.config.vehicle);
    let hitch = if sim.trailer.attached {
        "coupled"
    } else {
        "parked"
    };
    format!(
        "{:>3.0} km/h\nTool: {}\nImplement: {}",
        gauge.kmh,
        sim.tool.label(),
        hitch
    )
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HudStatusText;

pub fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(20.0),
                bottom: Val::Px(20.0),
                padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                border: UiRect::all(Val::Px(1.5)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.067, 0.067, 0.067, 0.9)),
            BorderColor(Color::WHITE),
            BorderRadius::all(Val::Px(6.0)),
        ))
        .with_children(|parent| {
            parent.spawn((
                HudStatusText,
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

pub fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn update_hud(sim: Res<SimulationState>, mut query: Query<&mut Text, With<HudStatusText>>) {
    let line = status_line(&sim);
    for mut text in &mut query {
        if text.0 != line {
            text.0 = line.clone();
        }
    }
}
