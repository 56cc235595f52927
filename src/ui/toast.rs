use bevy::prelude::*;

use crate::shared::*;

const TOAST_SECS: f32 = 2.5;
const FADE_SECS: f32 = 0.5;

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// Marker for the toast column (top-centre of the screen).
#[derive(Component)]
pub struct ToastContainer;

#[derive(Component)]
pub struct ToastItem {
    pub timer: Timer,
}

/// Message shown for a finished export or import.
pub fn snapshot_message(event: &SnapshotCompleteEvent) -> String {
    let action = if event.export { "Export" } else { "Import" };
    match (event.success, &event.error_message) {
        (true, _) => format!("{action} complete"),
        (false, Some(reason)) => format!("{action} failed: {reason}"),
        (false, None) => format!("{action} failed"),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_toast_container(mut commands: Commands) {
    commands.spawn((
        ToastContainer,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(20.0),
            left: Val::Percent(50.0),
            width: Val::Px(320.0),
            margin: UiRect {
                left: Val::Px(-160.0),
                ..default()
            },
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            align_items: AlignItems::Center,
            ..default()
        },
    ));
}

pub fn despawn_toast_container(
    mut commands: Commands,
    query: Query<Entity, With<ToastContainer>>,
) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn handle_snapshot_toasts(
    mut commands: Commands,
    mut events: EventReader<SnapshotCompleteEvent>,
    container_query: Query<Entity, With<ToastContainer>>,
) {
    let Ok(container) = container_query.get_single() else {
        return;
    };

    for event in events.read() {
        let colour = if event.success {
            Color::WHITE
        } else {
            Color::srgb(1.0, 0.55, 0.45)
        };
        let toast = commands
            .spawn((
                ToastItem {
                    timer: Timer::from_seconds(TOAST_SECS, TimerMode::Once),
                },
                Node {
                    padding: UiRect::axes(Val::Px(12.0), Val::Px(5.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Text::new(snapshot_message(event)),
                    TextFont {
                        font_size: 14.0,
                        ..default()
                    },
                    TextColor(colour),
                ));
            })
            .id();
        commands.entity(container).add_child(toast);
    }
}

/// Tick toast timers, fade the last half second, then despawn.
pub fn update_toasts(
    mut commands: Commands,
    time: Res<Time>,
    mut toasts: Query<(Entity, &mut ToastItem, &mut BackgroundColor)>,
) {
    for (entity, mut toast, mut bg) in &mut toasts {
        toast.timer.tick(time.delta());
        if toast.timer.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }
        let left = toast.timer.remaining_secs();
        if left < FADE_SECS {
            bg.0 = bg.0.with_alpha(0.75 * left / FADE_SECS);
        }
    }
}
