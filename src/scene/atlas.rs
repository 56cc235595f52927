//! Procedural tile images.
//!
//! Every image is a 24×27 RGBA raster holding one 2:1 diamond whose top
//! vertex sits 10 px below the top edge; the spare rows above leave room for
//! grass blades and seedlings that poke up out of the tile. Variants are
//! seeded per index so the atlas is identical run to run.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::shared::*;

/// Two cells wide, one cell tall plus headroom.
pub const TILE_IMAGE_WIDTH: u32 = 24;
pub const TILE_IMAGE_HEIGHT: u32 = 27;
/// Rows of headroom above the diamond's top vertex.
pub const TILE_IMAGE_TOP: f32 = 10.0;

const ROAD_BORDER: [u8; 3] = [0x80, 0x80, 0x80];
const ROAD: [u8; 3] = [0x2c, 0x2c, 0x2c];
const PLOWED: [u8; 3] = [0x3d, 0x26, 0x11];
const GRASS: [u8; 3] = [0x2d, 0x4c, 0x21];
const GRASS_BLADE: [u8; 3] = [0x3a, 0x5f, 0x27];
const DARK_GRASS: [u8; 3] = [0x1a, 0x2b, 0x13];
const DARK_GRASS_BLADE: [u8; 3] = [0x23, 0x3a, 0x1a];
const GRAVEL: [u8; 3] = [0x45, 0x3d, 0x33];

/// Key for one image in the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileImage {
    RoadBorder,
    Road,
    Plowed,
    Grass(u8),
    DarkGrass(u8),
    PebbledPlowed(u8),
    Seedling(u8),
    Gravel(u8),
    /// Translucent wash for shoulder cells beside gravel.
    GravelBlend,
    GravelBlendSpeck,
    /// Translucent wash for shoulder cells beside grass.
    GrassBlend,
}

impl TileImage {
    pub fn all() -> Vec<TileImage> {
        let mut keys = vec![
            TileImage::RoadBorder,
            TileImage::Road,
            TileImage::Plowed,
            TileImage::GravelBlend,
            TileImage::GravelBlendSpeck,
            TileImage::GrassBlend,
        ];
        for v in 0..VARIANT_COUNT as u8 {
            keys.push(TileImage::Grass(v));
            keys.push(TileImage::DarkGrass(v));
            keys.push(TileImage::PebbledPlowed(v));
            keys.push(TileImage::Seedling(v));
        }
        for v in 0..GRAVEL_VARIANT_COUNT as u8 {
            keys.push(TileImage::Gravel(v));
        }
        keys
    }

    pub fn raster(self) -> TileRaster {
        match self {
            TileImage::RoadBorder => TileRaster::diamond(ROAD_BORDER),
            TileImage::Road => TileRaster::diamond(ROAD),
            TileImage::Plowed => TileRaster::diamond(PLOWED),
            TileImage::Grass(v) => grass_tile(GRASS, GRASS_BLADE, v),
            TileImage::DarkGrass(v) => grass_tile(DARK_GRASS, DARK_GRASS_BLADE, v),
            TileImage::PebbledPlowed(v) => pebbled_tile(v),
            TileImage::Seedling(v) => seedling_tile(v),
            TileImage::Gravel(v) => gravel_tile(v),
            TileImage::GravelBlend => overlay_tile([120, 110, 95], 0.28, false),
            TileImage::GravelBlendSpeck => overlay_tile([120, 110, 95], 0.28, true),
            TileImage::GrassBlend => overlay_tile([105, 130, 95], 0.22, false),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raster
// ─────────────────────────────────────────────────────────────────────────────

/// Straight-alpha RGBA8 pixels with a few drawing primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TileRaster {
    pub fn blank() -> Self {
        Self {
            width: TILE_IMAGE_WIDTH,
            height: TILE_IMAGE_HEIGHT,
            pixels: vec![0; (TILE_IMAGE_WIDTH * TILE_IMAGE_HEIGHT * 4) as usize],
        }
    }

    /// Opaque diamond in `rgb`.
    pub fn diamond(rgb: [u8; 3]) -> Self {
        let mut raster = Self::blank();
        raster.fill_diamond(rgb, 1.0);
        raster
    }

    pub fn in_diamond(x: f32, y: f32) -> bool {
        let half = TILE_SIZE;
        (x - half).abs() / half + (y - TILE_IMAGE_TOP - half / 2.0).abs() / (half / 2.0) <= 1.0
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[((y * self.width + x) * 4 + 3) as usize]
    }

    fn blend(&mut self, x: i32, y: i32, rgb: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        let a = alpha.clamp(0.0, 1.0);
        let dst_a = self.pixels[i + 3] as f32 / 255.0;
        let out_a = a + dst_a * (1.0 - a);
        if out_a <= 0.0 {
            return;
        }
        for c in 0..3 {
            let src = rgb[c] as f32;
            let dst = self.pixels[i + c] as f32;
            self.pixels[i + c] = ((src * a + dst * dst_a * (1.0 - a)) / out_a).round() as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    pub fn fill_diamond(&mut self, rgb: [u8; 3], alpha: f32) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if Self::in_diamond(x as f32 + 0.5, y as f32 + 0.5) {
                    self.blend(x, y, rgb, alpha);
                }
            }
        }
    }

    /// Filled axis-aligned ellipse inside the box at `(x, y)` of size `w`×`h`.
    pub fn fill_oval(&mut self, x: f32, y: f32, w: f32, h: f32, rgb: [u8; 3], alpha: f32) {
        let (cx, cy) = (x + w / 2.0, y + h / 2.0);
        let (rx, ry) = ((w / 2.0).max(0.5), (h / 2.0).max(0.5));
        for py in (y.floor() as i32)..=((y + h).ceil() as i32) {
            for px in (x.floor() as i32)..=((x + w).ceil() as i32) {
                let dx = (px as f32 + 0.5 - cx) / rx;
                let dy = (py as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend(px, py, rgb, alpha);
                }
            }
        }
    }

    pub fn stroke(&mut self, from: Vec2, to: Vec2, width: f32, rgb: [u8; 3], alpha: f32) {
        let steps = (from.distance(to).ceil() as i32 * 2).max(1);
        let r = width / 2.0;
        let mut touched = Vec::new();
        for s in 0..=steps {
            let p = from.lerp(to, s as f32 / steps as f32);
            for py in ((p.y - r).floor() as i32)..=((p.y + r).ceil() as i32) {
                for px in ((p.x - r).floor() as i32)..=((p.x + r).ceil() as i32) {
                    let centre = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                    if centre.distance(p) <= r.max(0.5) && !touched.contains(&(px, py)) {
                        touched.push((px, py));
                    }
                }
            }
        }
        for (px, py) in touched {
            self.blend(px, py, rgb, alpha);
        }
    }

    pub fn to_image(&self) -> Image {
        let mut image = Image::new(
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.pixels.clone(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        );
        image.sampler = bevy::image::ImageSampler::nearest();
        image
    }
}

fn shade(rgb: [u8; 3], factor: f32) -> [u8; 3] {
    rgb.map(|c| (c as f32 * factor).round().clamp(0.0, 255.0) as u8)
}

fn grey(level: f32) -> [u8; 3] {
    let v = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
    [v, v, v]
}

// ─────────────────────────────────────────────────────────────────────────────
// Families
// ─────────────────────────────────────────────────────────────────────────────

fn grass_tile(base: [u8; 3], blade: [u8; 3], variant: u8) -> TileRaster {
    let mut raster = TileRaster::diamond(base);
    let mut rng = StdRng::seed_from_u64(variant as u64);
    let count = rng.gen_range(6..12);
    for _ in 0..count {
        let x = 4.0 + rng.gen::<f32>() * TILE_SIZE * 1.5;
        let y = TILE_IMAGE_TOP + 2.0 + rng.gen::<f32>() * TILE_SIZE / 2.0;
        let height: f32 = rng.gen_range(3.0..8.0);
        let bend: f32 = rng.gen_range(-2.0..2.0);
        let colour = shade(blade, rng.gen_range(0.8..1.2));
        let width: f32 = rng.gen_range(1.0..1.5);
        raster.stroke(Vec2::new(x, y), Vec2::new(x + bend, y - height), width, colour, 1.0);
    }
    raster
}

fn pebbled_tile(variant: u8) -> TileRaster {
    let mut raster = TileRaster::diamond(PLOWED);
    let mut rng = StdRng::seed_from_u64(variant as u64);
    let count = rng.gen_range(2..7);
    for _ in 0..count {
        let x = 4.0 + rng.gen::<f32>() * TILE_SIZE * 1.3;
        let y = TILE_IMAGE_TOP + 2.0 + rng.gen::<f32>() * TILE_SIZE / 2.0;
        let size: f32 = rng.gen_range(0.8..2.6);
        let tone = grey(rng.gen_range(0.15..0.35));
        raster.fill_oval(x, y, size, size * 0.6, tone, 1.0);
        raster.fill_oval(x + size * 0.2, y, size * 0.3, size * 0.3, grey(0.5), 0.2);
    }
    raster
}

fn seedling_tile(variant: u8) -> TileRaster {
    let mut raster = TileRaster::diamond(PLOWED);
    let mut rng = StdRng::seed_from_u64(variant as u64);
    let root = Vec2::new(TILE_SIZE, TILE_SIZE / 2.0 + TILE_IMAGE_TOP + 3.0);
    let hue: f32 = rng.gen_range(95.0..135.0);
    let saturation: f32 = rng.gen_range(0.4..0.7);
    let value: f32 = rng.gen_range(0.3..0.5);
    let srgba = Color::hsv(hue, saturation, value).to_srgba();
    let colour = [srgba.red, srgba.green, srgba.blue].map(|c| (c * 255.0).round() as u8);
    let width: f32 = rng.gen_range(1.0..1.4);

    for (spread, lean) in [(-100.0_f32, -35.0_f32), (-80.0, 35.0)] {
        let len: f32 = rng.gen_range(2.5..5.0);
        let angle = (spread + rng.gen::<f32>() * lean).to_radians();
        let tip = root + Vec2::new(angle.cos(), angle.sin()) * len;
        raster.stroke(root, tip, width, colour, 1.0);
    }
    raster
}

fn gravel_tile(variant: u8) -> TileRaster {
    let mut raster = TileRaster::diamond(shade(GRAVEL, 0.7));
    let mut rng = StdRng::seed_from_u64(variant as u64 * 999);

    for _ in 0..250 {
        let x = rng.gen::<f32>() * TILE_SIZE * 2.0;
        let y = TILE_IMAGE_TOP + rng.gen::<f32>() * TILE_SIZE;
        if TileRaster::in_diamond(x, y) {
            let colour = shade(GRAVEL, rng.gen_range(0.7..0.9));
            raster.fill_oval(x, y, 1.5, 1.5, colour, 0.3);
        }
    }

    let pebbles = rng.gen_range(40..60);
    for _ in 0..pebbles {
        let x = rng.gen::<f32>() * TILE_SIZE * 1.8;
        let y = TILE_IMAGE_TOP + rng.gen::<f32>() * TILE_SIZE * 0.9;
        if !TileRaster::in_diamond(x, y) {
            continue;
        }
        let size: f32 = rng.gen_range(2.0..5.5);
        raster.fill_oval(x + 1.0, y + 1.0, size, size * 0.6, [0, 0, 0], 0.4);
        let tone = rng.gen::<f32>();
        let colour = if tone > 0.6 {
            [0x87, 0x87, 0x87]
        } else if tone > 0.2 {
            [0x5c, 0x5b, 0x5b]
        } else {
            [0x75, 0x6c, 0x5c]
        };
        raster.fill_oval(x, y, size, size * 0.6, colour, 1.0);
        raster.fill_oval(x + size / 4.0, y + size / 10.0, size / 2.0, size / 4.0, [255, 255, 255], 0.15);
    }
    raster
}

fn overlay_tile(rgb: [u8; 3], alpha: f32, speck: bool) -> TileRaster {
    let mut raster = TileRaster::blank();
    raster.fill_diamond(rgb, alpha);
    if speck {
        raster.fill_oval(TILE_SIZE - 3.0, TILE_IMAGE_TOP + 2.0, 2.2, 1.4, [90, 90, 90], 0.35);
    }
    raster
}

// ─────────────────────────────────────────────────────────────────────────────
// Bevy side
// ─────────────────────────────────────────────────────────────────────────────

/// Uploaded tile images, built once while loading.
#[derive(Resource, Default)]
pub struct TileAtlas {
    pub images: HashMap<TileImage, Handle<Image>>,
}

impl TileAtlas {
    pub fn get(&self, key: TileImage) -> Option<&Handle<Image>> {
        self.images.get(&key)
    }
}

pub fn build_tile_atlas(mut commands: Commands, mut images: ResMut<Assets<Image>>) {
    let mut atlas = TileAtlas::default();
    for key in TileImage::all() {
        let handle = images.add(key.raster().to_image());
        atlas.images.insert(key, handle);
    }
    info!("Tile atlas built: {} images", atlas.images.len());
    commands.insert_resource(atlas);
}
