//! Bevy side of the scene: loads the sprite sheets and maps each frame's
//! `SceneFrame` onto a pool of sprite entities.
//!
//! Composition works in viewport pixels (top-left origin, y down). The
//! camera sits at the origin, so a viewport point maps to world space as
//! `(x - w/2, h/2 - y)` and every rotation flips sign.

use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::sprite::Anchor;
use bevy::window::PrimaryWindow;

use crate::shared::*;
use crate::sim::SimulationState;

use super::atlas::TileAtlas;
use super::compose::{
    compose, LinePaint, SceneItem, IMPLEMENT_SIZE, TRACTOR_FRAME_SIZE, TRACTOR_SCALE,
    TREE_FRAME_SIZE, TREE_SCALE, TREE_SHEET_COLUMNS, TREE_SHEET_ROWS,
};

const BACKGROUND: Color = Color::srgb(0.051, 0.102, 0.039);
const YELLOW_PAINT: Color = Color::srgb(0.95, 0.8, 0.2);
const WHITE_PAINT: Color = Color::srgba(0.95, 0.95, 0.92, 0.85);
const HITCH_BAR: Color = Color::BLACK;
const PLOW_COLOUR: Color = Color::srgb(0.2, 0.35, 0.85);
const PLANTER_COLOUR: Color = Color::srgb(0.25, 0.55, 0.2);
const HITCH_BAR_WIDTH: f32 = 2.0;

/// Spacing between successive draw items on the z axis.
const Z_STEP: f32 = 0.001;

/// Transparent rows under the shed artwork, in source pixels.
const SHED_FOOT_MARGIN: f32 = 10.0;

const TRACTOR_SHEET: &str = "sprites/tractor.png";
const TREE_SHEET: &str = "sprites/trees.png";
const SHED_IMAGE: &str = "sprites/shed.png";

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// Handles for the externally supplied artwork.
#[derive(Resource, Default)]
pub struct SceneAssets {
    pub tractor_image: Handle<Image>,
    pub tractor_layout: Handle<TextureAtlasLayout>,
    pub trees_image: Handle<Image>,
    pub trees_layout: Handle<TextureAtlasLayout>,
    pub shed_image: Handle<Image>,
    /// Set once a missing sheet has been reported.
    pub failure_logged: bool,
}

/// Sprite entities reused from frame to frame, in draw order.
#[derive(Resource, Default)]
pub struct ScenePool {
    pub entities: Vec<Entity>,
}

#[derive(Component)]
pub struct ScenePiece;

/// Frame rectangles for a sheet whose cells are not whole pixels wide.
pub fn sheet_frames(frame: Vec2, columns: usize, rows: usize) -> Vec<URect> {
    let mut rects = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for col in 0..columns {
            let min = Vec2::new(col as f32 * frame.x, row as f32 * frame.y).round();
            let max = Vec2::new((col + 1) as f32 * frame.x, (row + 1) as f32 * frame.y).round();
            rects.push(URect::new(min.x as u32, min.y as u32, max.x as u32, max.y as u32));
        }
    }
    rects
}

fn sheet_layout(frame: Vec2, columns: usize, rows: usize) -> TextureAtlasLayout {
    let size = (frame * Vec2::new(columns as f32, rows as f32)).round();
    let mut layout = TextureAtlasLayout::new_empty(UVec2::new(size.x as u32, size.y as u32));
    for rect in sheet_frames(frame, columns, rows) {
        layout.add_texture(rect);
    }
    layout
}

pub fn load_scene_assets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    let tractor_columns = crate::vehicle::tractor::SHEET_COLUMNS;
    let tractor_rows = crate::vehicle::tractor::SHEET_ROWS;
    commands.insert_resource(SceneAssets {
        tractor_image: asset_server.load(TRACTOR_SHEET),
        tractor_layout: layouts.add(sheet_layout(
            TRACTOR_FRAME_SIZE,
            tractor_columns,
            tractor_rows,
        )),
        trees_image: asset_server.load(TREE_SHEET),
        trees_layout: layouts.add(sheet_layout(
            TREE_FRAME_SIZE,
            TREE_SHEET_COLUMNS,
            TREE_SHEET_ROWS,
        )),
        shed_image: asset_server.load(SHED_IMAGE),
        failure_logged: false,
    });
}

/// Missing artwork is not fatal; the pieces that need it simply do not draw.
pub fn report_missing_assets(asset_server: Res<AssetServer>, mut assets: ResMut<SceneAssets>) {
    if assets.failure_logged {
        return;
    }
    let sheets = [
        (TRACTOR_SHEET, assets.tractor_image.id()),
        (TREE_SHEET, assets.trees_image.id()),
        (SHED_IMAGE, assets.shed_image.id()),
    ];
    let mut failed = false;
    for (path, id) in sheets {
        if matches!(asset_server.load_state(id), LoadState::Failed(_)) {
            warn!("Sprite sheet {path} failed to load; it will not be drawn");
            failed = true;
        }
    }
    assets.failure_logged = failed;
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.insert_resource(ClearColor(BACKGROUND));
}

/// Keep the simulation's idea of the view size in step with the window.
pub fn track_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut sim: ResMut<SimulationState>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if size.x > 0.0 && size.y > 0.0 && sim.viewport != size {
        sim.viewport = size;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sprite sync
// ─────────────────────────────────────────────────────────────────────────────

fn to_world(viewport: Vec2, px: Vec2) -> Vec2 {
    Vec2::new(px.x - viewport.x / 2.0, viewport.y / 2.0 - px.y)
}

/// A straight segment as one rotated, stretched sprite.
fn segment(viewport: Vec2, from: Vec2, to: Vec2, width: f32, color: Color) -> (Sprite, Transform) {
    let a = to_world(viewport, from);
    let b = to_world(viewport, to);
    let delta = b - a;
    let sprite = Sprite {
        color,
        custom_size: Some(Vec2::new(delta.length(), width)),
        ..default()
    };
    let transform = Transform::from_translation(((a + b) / 2.0).extend(0.0))
        .with_rotation(Quat::from_rotation_z(delta.y.atan2(delta.x)));
    (sprite, transform)
}

fn piece(
    item: &SceneItem,
    viewport: Vec2,
    atlas: &TileAtlas,
    assets: &SceneAssets,
    images: &Assets<Image>,
) -> Option<(Sprite, Transform)> {
    match item {
        SceneItem::Tile { image, at } => {
            let handle = atlas.get(*image)?;
            let sprite = Sprite {
                image: handle.clone(),
                anchor: Anchor::TopLeft,
                ..default()
            };
            Some((sprite, Transform::from_translation(to_world(viewport, *at).extend(0.0))))
        }
        SceneItem::RoadLine {
            from,
            to,
            width,
            paint,
        } => {
            let color = match paint {
                LinePaint::Yellow => YELLOW_PAINT,
                LinePaint::White => WHITE_PAINT,
            };
            Some(segment(viewport, *from, *to, *width, color))
        }
        SceneItem::HitchBar { from, to } => {
            Some(segment(viewport, *from, *to, HITCH_BAR_WIDTH, HITCH_BAR))
        }
        SceneItem::Tree { frame, foot, .. } => {
            let mut sprite = Sprite::from_atlas_image(
                assets.trees_image.clone(),
                TextureAtlas {
                    layout: assets.trees_layout.clone(),
                    index: *frame,
                },
            );
            sprite.custom_size = Some(TREE_FRAME_SIZE * TREE_SCALE);
            sprite.anchor = Anchor::BottomCenter;
            Some((sprite, Transform::from_translation(to_world(viewport, *foot).extend(0.0))))
        }
        SceneItem::Structure { base, width } => {
            // Aspect ratio comes from the artwork, so wait for it.
            let image = images.get(&assets.shed_image)?;
            let source = image.size_f32();
            if source.x <= 0.0 {
                return None;
            }
            let scale = width / source.x;
            let sprite = Sprite {
                image: assets.shed_image.clone(),
                custom_size: Some(source * scale),
                anchor: Anchor::BottomCenter,
                ..default()
            };
            let foot = *base + Vec2::new(0.0, SHED_FOOT_MARGIN * scale);
            Some((sprite, Transform::from_translation(to_world(viewport, foot).extend(0.0))))
        }
        SceneItem::Implement {
            centre,
            rotation_deg,
            tool,
        } => {
            let color = match tool {
                Tool::Plow => PLOW_COLOUR,
                Tool::Planter => PLANTER_COLOUR,
            };
            let sprite = Sprite {
                color,
                custom_size: Some(IMPLEMENT_SIZE),
                ..default()
            };
            let transform = Transform::from_translation(to_world(viewport, *centre).extend(0.0))
                .with_rotation(Quat::from_rotation_z(-rotation_deg.to_radians()));
            Some((sprite, transform))
        }
        SceneItem::Tractor { foot, frame } => {
            let mut sprite = Sprite::from_atlas_image(
                assets.tractor_image.clone(),
                TextureAtlas {
                    layout: assets.tractor_layout.clone(),
                    index: *frame,
                },
            );
            sprite.custom_size = Some(TRACTOR_FRAME_SIZE * TRACTOR_SCALE);
            sprite.anchor = Anchor::Custom(Vec2::new(0.0, -0.35));
            Some((sprite, Transform::from_translation(to_world(viewport, *foot).extend(0.0))))
        }
    }
}

/// Recompose the scene and push it onto the sprite pool.
pub fn sync_scene(
    mut commands: Commands,
    sim: Res<SimulationState>,
    atlas: Option<Res<TileAtlas>>,
    assets: Res<SceneAssets>,
    images: Res<Assets<Image>>,
    mut pool: ResMut<ScenePool>,
    mut pieces: Query<(&mut Sprite, &mut Transform, &mut Visibility), With<ScenePiece>>,
) {
    let Some(atlas) = atlas else {
        return;
    };
    let frame = compose(&sim);
    let viewport = sim.viewport;

    let mut slot = 0;
    for item in &frame.items {
        let Some((sprite, mut transform)) = piece(item, viewport, &atlas, &assets, &images) else {
            continue;
        };
        transform.translation.z = slot as f32 * Z_STEP;

        match pool.entities.get(slot).copied() {
            Some(entity) => {
                if let Ok((mut s, mut t, mut v)) = pieces.get_mut(entity) {
                    *s = sprite;
                    *t = transform;
                    *v = Visibility::Inherited;
                }
            }
            None => {
                let entity = commands.spawn((sprite, transform, ScenePiece)).id();
                pool.entities.push(entity);
            }
        }
        slot += 1;
    }

    for &entity in pool.entities.iter().skip(slot) {
        if let Ok((_, _, mut v)) = pieces.get_mut(entity) {
            *v = Visibility::Hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_centre_is_world_origin() {
        let viewport = Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        assert_eq!(to_world(viewport, viewport / 2.0), Vec2::ZERO);
        assert_eq!(to_world(viewport, Vec2::ZERO), Vec2::new(-500.0, 350.0));
    }

    #[test]
    fn tractor_frames_tile_the_sheet() {
        let rects = sheet_frames(TRACTOR_FRAME_SIZE, 6, 4);
        assert_eq!(rects.len(), 24);
        assert_eq!(rects[0].min, UVec2::ZERO);
        assert_eq!(rects[23].max, UVec2::new(931, 472));
        for pair in rects.windows(2).filter(|w| w[0].min.y == w[1].min.y) {
            assert_eq!(pair[0].max.x, pair[1].min.x, "frames must not overlap or gap");
        }
    }

    #[test]
    fn tree_frames_round_half_pixel_rows() {
        let rects = sheet_frames(TREE_FRAME_SIZE, 4, 2);
        assert_eq!(rects.len(), 8);
        assert_eq!(rects[4].min.y, rects[0].max.y);
        assert_eq!(rects[7].max, UVec2::new(416, 541));
    }

    #[test]
    fn segments_span_their_endpoints() {
        let viewport = Vec2::new(100.0, 100.0);
        let (sprite, transform) =
            segment(viewport, Vec2::new(10.0, 50.0), Vec2::new(10.0, 90.0), 2.0, HITCH_BAR);
        assert_eq!(sprite.custom_size, Some(Vec2::new(40.0, 2.0)));
        assert_eq!(transform.translation.truncate(), Vec2::new(-40.0, -20.0));
    }
}
