//! Shared components, resources, events, and states for Furrow.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports another domain's Bevy systems directly; the pure
//! simulation types (grid, vehicles, editor) are reached through `sim`.

use bevy::prelude::*;
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Side of one grid cell in world pixels. Screen diamonds are 2T wide, T tall.
pub const TILE_SIZE: f32 = 12.0;
pub const MAP_SIZE: i32 = 200;

pub const SCREEN_WIDTH: f32 = 1000.0;
pub const SCREEN_HEIGHT: f32 = 700.0;

/// Columns `0..CORRIDOR_COLS` are the access corridor (road + border).
pub const CORRIDOR_COLS: i32 = 12;
/// Cells this close to the map edge render as dark grass and are never farmed.
pub const EDGE_MARGIN: i32 = 5;

/// Number of noise-indexed variants per tile family.
pub const VARIANT_COUNT: usize = 64;
pub const GRAVEL_VARIANT_COUNT: usize = 16;

pub const TRACTOR_START: Vec2 = Vec2::new(500.0, 500.0);
pub const TRACTOR_START_HEADING: f32 = 45.0;
pub const TRAILER_START: Vec2 = Vec2::new(430.0, 430.0);
pub const TRAILER_START_ANGLE: f32 = 45.0;

/// The equipment shed, in grid cells.
pub const SHED: Structure = Structure {
    col: 60,
    row: 60,
    width: 6,
    height: 8,
};

/// Grid coordinate as `(row, col)`.
pub type Cell = (i32, i32);

/// Grid cell containing a world position.
pub fn world_to_cell(pos: Vec2) -> Cell {
    (
        (pos.y / TILE_SIZE).floor() as i32,
        (pos.x / TILE_SIZE).floor() as i32,
    )
}

pub fn is_corridor(col: i32) -> bool {
    (0..CORRIDOR_COLS).contains(&col)
}

// ═══════════════════════════════════════════════════════════════════════
// TERRAIN
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TerrainKind {
    #[default]
    Grass,
    Dirt,
    Planted,
    GravelRoad,
    /// Shoulder next to gravel. Derived only, never painted by the player.
    LightDirt,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 5] = [
        TerrainKind::Grass,
        TerrainKind::Dirt,
        TerrainKind::Planted,
        TerrainKind::GravelRoad,
        TerrainKind::LightDirt,
    ];

    /// Integer code used by the text snapshot.
    pub fn code(self) -> u8 {
        match self {
            TerrainKind::Grass => 0,
            TerrainKind::Dirt => 1,
            TerrainKind::Planted => 2,
            TerrainKind::GravelRoad => 3,
            TerrainKind::LightDirt => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TerrainKind::Grass),
            1 => Some(TerrainKind::Dirt),
            2 => Some(TerrainKind::Planted),
            3 => Some(TerrainKind::GravelRoad),
            4 => Some(TerrainKind::LightDirt),
            _ => None,
        }
    }

    /// Road and its shoulder are never touched by implements.
    pub fn is_protected(self) -> bool {
        matches!(self, TerrainKind::GravelRoad | TerrainKind::LightDirt)
    }
}

/// Static rectangular obstacle on the grid (the shed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Structure {
    pub col: i32,
    pub row: i32,
    pub width: i32,
    pub height: i32,
}

impl Structure {
    /// Strict interior test in world pixels.
    pub fn contains(&self, pos: Vec2) -> bool {
        let min_x = self.col as f32 * TILE_SIZE;
        let max_x = (self.col + self.width) as f32 * TILE_SIZE;
        let min_y = self.row as f32 * TILE_SIZE;
        let max_y = (self.row + self.height) as f32 * TILE_SIZE;
        pos.x > min_x && pos.x < max_x && pos.y > min_y && pos.y < max_y
    }

    /// Depth of the front-left corner the building stands on.
    pub fn base_depth(&self) -> f32 {
        (self.col as f32 * TILE_SIZE + (self.row + self.height) as f32 * TILE_SIZE) / 2.0
    }

    /// Centre cell, used as the courtyard origin.
    pub fn centre_cell(&self) -> Cell {
        (self.row + self.height / 2, self.col + self.width / 2)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TOOLS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Plow,
    Planter,
}

impl Tool {
    pub fn toggled(self) -> Self {
        match self {
            Tool::Plow => Tool::Planter,
            Tool::Planter => Tool::Plow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Plow => "Plow",
            Tool::Planter => "Planter",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT: held controls plus one-shot actions for this frame
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

/// Written once per frame in PreUpdate by the input domain; the simulation
/// only reads it.
#[derive(Resource, Debug, Clone, Default)]
pub struct ControlInput {
    pub held: HashSet<Control>,
    pub toggle_tool: bool,
    pub toggle_hitch: bool,
    /// Primary click this frame, in window pixels (top-left origin).
    pub click: Option<Vec2>,
    /// Secondary click this frame, in window pixels.
    pub paint_click: Option<Vec2>,
    pub export: bool,
    pub import: bool,
}

impl ControlInput {
    pub fn holding(&self, control: Control) -> bool {
        self.held.contains(&control)
    }

    /// Convenience for tests and scripted drivers.
    pub fn with_held(controls: &[Control]) -> Self {
        Self {
            held: controls.iter().copied().collect(),
            ..Default::default()
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub turn_left: KeyCode,
    pub turn_right: KeyCode,
    pub toggle_tool: KeyCode,
    pub toggle_hitch: KeyCode,
    pub export: KeyCode,
    pub import: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            turn_left: KeyCode::KeyA,
            turn_right: KeyCode::KeyD,
            toggle_tool: KeyCode::KeyQ,
            toggle_hitch: KeyCode::KeyC,
            export: KeyCode::F5,
            import: KeyCode::F9,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// A cell's terrain kind changed during play (implement stamp or painting).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TileChangedEvent {
    pub row: i32,
    pub col: i32,
    pub kind: TerrainKind,
}

/// Write the field snapshot to disk.
#[derive(Event, Debug, Clone, Default)]
pub struct ExportRequestEvent;

/// Re-read the field snapshot from disk over the current grid.
#[derive(Event, Debug, Clone, Default)]
pub struct ImportRequestEvent;

/// Sent by the save domain after an export or import finishes.
#[derive(Event, Debug, Clone)]
pub struct SnapshotCompleteEvent {
    pub export: bool,
    pub success: bool,
    pub error_message: Option<String>,
}
