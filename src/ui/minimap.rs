//! Minimap: a circular radar in the top-right corner showing the farm
//! overlay around the tractor, with two zoom buttons beside it.
//!
//! The radar image is rendered on the CPU from `MinimapOverlay` and copied
//! into a dynamic texture shown by an `ImageNode`. It is redrawn only when
//! the view moves or a field cell changes.

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::config::FarmConfig;
use crate::farming::MinimapOverlay;
use crate::shared::*;
use crate::sim::SimulationState;

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Radar diameter in UI pixels; the texture is the same size.
pub const MINIMAP_SIZE: usize = 140;
pub const MINIMAP_MARGIN: f32 = 20.0;

pub const MIN_VIEW_RADIUS: f32 = 8.0;
pub const MAX_VIEW_RADIUS: f32 = 90.0;
pub const ZOOM_STEP: f32 = 4.0;

/// Button centres relative to the radar centre.
pub const ZOOM_IN_OFFSET: Vec2 = Vec2::new(50.0, 50.0);
pub const ZOOM_OUT_OFFSET: Vec2 = Vec2::new(20.0, 65.0);
pub const BUTTON_HIT_RADIUS: f32 = 12.0;
const BUTTON_DRAW_RADIUS: f32 = 14.0;

const BACKDROP: [u8; 4] = [0x11, 0x11, 0x11, 217];
const RIM: [u8; 4] = [255, 255, 255, 255];
const MARKER: [u8; 4] = [255, 255, 0, 255];
const RIM_WIDTH: f32 = 2.0;
const MARKER_RADIUS: f32 = 3.0;

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES & COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// How many cells either side of the tractor the radar shows.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct MinimapView {
    pub radius: f32,
}

impl Default for MinimapView {
    fn default() -> Self {
        Self { radius: 25.0 }
    }
}

impl MinimapView {
    pub fn zoom_in(&mut self) {
        self.radius = (self.radius - ZOOM_STEP).max(MIN_VIEW_RADIUS);
    }

    pub fn zoom_out(&mut self) {
        self.radius = (self.radius + ZOOM_STEP).min(MAX_VIEW_RADIUS);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomButton {
    In,
    Out,
}

#[derive(Resource)]
pub struct MinimapImage(pub Handle<Image>);

#[derive(Component)]
pub struct MinimapNode;

// ═══════════════════════════════════════════════════════════════════════
// PURE HELPERS
// ═══════════════════════════════════════════════════════════════════════

/// Radar centre in window pixels for a view of the given width.
pub fn radar_centre(view_width: f32) -> Vec2 {
    let half = MINIMAP_SIZE as f32 / 2.0;
    Vec2::new(view_width - MINIMAP_SIZE as f32 - MINIMAP_MARGIN + half, MINIMAP_MARGIN + half)
}

/// Which zoom button, if any, a click at `pointer` lands on.
pub fn zoom_hit(pointer: Vec2, centre: Vec2) -> Option<ZoomButton> {
    if pointer.distance(centre + ZOOM_IN_OFFSET) < BUTTON_HIT_RADIUS {
        Some(ZoomButton::In)
    } else if pointer.distance(centre + ZOOM_OUT_OFFSET) < BUTTON_HIT_RADIUS {
        Some(ZoomButton::Out)
    } else {
        None
    }
}

/// Straight alpha "over" composite of `src` onto `dst`.
fn composite(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}

/// Render the radar: the overlay window of ±`radius` cells around the
/// tractor's world position, clipped to a circle, with a rim and a centre
/// marker. Returns `MINIMAP_SIZE²` RGBA pixels, row-major.
pub fn render_minimap(overlay: &MinimapOverlay, tractor: Vec2, radius: f32) -> Vec<u8> {
    let size = MINIMAP_SIZE;
    let half = size as f32 / 2.0;
    let cells_per_px = radius * 2.0 / size as f32;
    let origin = tractor / TILE_SIZE - Vec2::splat(radius);

    let mut data = vec![0u8; size * size * 4];
    for y in 0..size {
        for x in 0..size {
            let from_centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - Vec2::splat(half);
            let dist = from_centre.length();
            if dist > half {
                continue;
            }

            let pixel = if dist > half - RIM_WIDTH {
                RIM
            } else if dist <= MARKER_RADIUS {
                MARKER
            } else {
                let sample = origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * cells_per_px;
                let row = sample.y.floor() as i32;
                let col = sample.x.floor() as i32;
                match overlay.pixel(row, col) {
                    Some(colour) => composite(BACKDROP, colour),
                    None => BACKDROP,
                }
            };

            let offset = (y * size + x) * 4;
            data[offset..offset + 4].copy_from_slice(&pixel);
        }
    }
    data
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn spawn_zoom_button(commands: &mut Commands, offset: Vec2, label: &str, font_size: f32) {
    // Offsets are measured from the radar centre, which sits
    // MINIMAP_MARGIN + half a radar in from the top-right corner.
    let inset = MINIMAP_MARGIN + MINIMAP_SIZE as f32 / 2.0;
    commands
        .spawn((
            MinimapNode,
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(inset - offset.x - BUTTON_DRAW_RADIUS),
                top: Val::Px(inset + offset.y - BUTTON_DRAW_RADIUS),
                width: Val::Px(BUTTON_DRAW_RADIUS * 2.0),
                height: Val::Px(BUTTON_DRAW_RADIUS * 2.0),
                border: UiRect::all(Val::Px(1.2)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BorderRadius::MAX,
            BorderColor(Color::WHITE),
            BackgroundColor(Color::srgb_u8(0x11, 0x11, 0x11)),
            GlobalZIndex(11),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(label),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

/// Create the radar texture and UI nodes. Runs on OnEnter(Playing).
pub fn spawn_minimap(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    config: Res<FarmConfig>,
) {
    let size = Extent3d {
        width: MINIMAP_SIZE as u32,
        height: MINIMAP_SIZE as u32,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.sampler = bevy::image::ImageSampler::nearest();
    let handle = images.add(image);

    let radius = config
        .view
        .minimap_view_radius
        .clamp(MIN_VIEW_RADIUS, MAX_VIEW_RADIUS);
    commands.insert_resource(MinimapView { radius });
    commands.insert_resource(MinimapImage(handle.clone()));

    commands.spawn((
        MinimapNode,
        ImageNode {
            image: handle,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(MINIMAP_MARGIN),
            top: Val::Px(MINIMAP_MARGIN),
            width: Val::Px(MINIMAP_SIZE as f32),
            height: Val::Px(MINIMAP_SIZE as f32),
            ..default()
        },
        GlobalZIndex(10),
    ));
    spawn_zoom_button(&mut commands, ZOOM_IN_OFFSET, "+", 14.0);
    spawn_zoom_button(&mut commands, ZOOM_OUT_OFFSET, "-", 20.0);
}

pub fn despawn_minimap(mut commands: Commands, query: Query<Entity, With<MinimapNode>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
    commands.remove_resource::<MinimapImage>();
}

/// Primary clicks on a zoom button change the radar radius.
pub fn handle_zoom_clicks(
    input: Res<ControlInput>,
    sim: Res<SimulationState>,
    mut view: ResMut<MinimapView>,
) {
    let Some(pointer) = input.click else {
        return;
    };
    match zoom_hit(pointer, radar_centre(sim.viewport.x)) {
        Some(ZoomButton::In) => view.zoom_in(),
        Some(ZoomButton::Out) => view.zoom_out(),
        None => return,
    }
    debug!("Minimap radius now {}", view.radius);
}

/// Where and how wide the radar was last drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarFrame {
    pub centre: Vec2,
    pub radius: f32,
}

/// The radar must be redrawn when it was never drawn, when it moved or
/// zoomed, or when any field cell changed under it.
pub fn needs_redraw(last: Option<RadarFrame>, next: RadarFrame, field_changed: bool) -> bool {
    field_changed || last != Some(next)
}

pub fn update_minimap(
    sim: Res<SimulationState>,
    view: Res<MinimapView>,
    minimap: Option<Res<MinimapImage>>,
    mut images: ResMut<Assets<Image>>,
    mut tile_events: EventReader<TileChangedEvent>,
    mut snapshot_events: EventReader<SnapshotCompleteEvent>,
    mut last: Local<Option<RadarFrame>>,
) {
    let field_changed = tile_events.read().count() > 0
        || snapshot_events.read().any(|ev| !ev.export && ev.success);
    let Some(minimap) = minimap else {
        return;
    };
    let frame = RadarFrame {
        centre: sim.tractor.position,
        radius: view.radius,
    };
    if !needs_redraw(*last, frame, field_changed) {
        return;
    }
    let Some(image) = images.get_mut(&minimap.0) else {
        return;
    };
    let pixels = render_minimap(&sim.overlay, frame.centre, frame.radius);
    if image.data.len() == pixels.len() {
        image.data.copy_from_slice(&pixels);
        *last = Some(frame);
    }
}
