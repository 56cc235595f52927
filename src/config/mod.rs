//! Config layer: tunable constants read from `assets/config/farm.ron`.
//!
//! Runs in OnEnter(GameState::Loading) before world generation. Every field
//! has a default, so a missing file or a partial one is fine; a malformed
//! file is logged and the defaults are used.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH: &str = "assets/config/farm.ron";

/// Errors that can occur while loading the farm config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Tractor kinematics. Rates are per 60 Hz frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    pub max_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub brake_force: f32,
    /// Turn rate cap in degrees per frame.
    pub base_rotation: f32,
    pub heading_smoothing: f32,
    /// Speedometer full-scale reading.
    pub max_speed_kmh: f32,
}

impl Default for VehicleSettings {
    fn default() -> Self {
        Self {
            max_speed: 2.6,
            acceleration: 0.008,
            friction: 0.015,
            brake_force: 0.04,
            base_rotation: 1.2,
            heading_smoothing: 0.25,
            max_speed_kmh: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitchSettings {
    pub rest_distance: f32,
    /// How far behind the tractor origin the hitch point sits.
    pub coupling_radius: f32,
    pub coupling_threshold: f32,
    pub min_separation: f32,
    pub forward_alignment: f32,
    pub reverse_alignment: f32,
}

impl Default for HitchSettings {
    fn default() -> Self {
        Self {
            rest_distance: 60.0,
            coupling_radius: 30.0,
            coupling_threshold: 35.0,
            min_separation: 28.0,
            forward_alignment: 0.4,
            reverse_alignment: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub footprint_radius: i32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self { footprint_radius: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Cells drawn around the tractor in each direction.
    pub scene_radius: i32,
    /// Extra screen pixels kept around the viewport before culling.
    pub cull_margin: f32,
    pub minimap_view_radius: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            scene_radius: 65,
            cull_margin: 150.0,
            minimap_view_radius: 25.0,
        }
    }
}

/// All tunables, one resource.
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub vehicle: VehicleSettings,
    pub hitch: HitchSettings,
    pub editor: EditorSettings,
    pub view: ViewSettings,
}

impl FarmConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    /// Read the file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FarmConfig>()
            .add_systems(OnEnter(crate::shared::GameState::Loading), load_config);
    }
}

pub fn load_config(mut config: ResMut<FarmConfig>) {
    match FarmConfig::load(Path::new(CONFIG_PATH)) {
        Ok(loaded) => {
            info!(
                "Config: max speed {:.2}, rest distance {:.0}, footprint radius {}",
                loaded.vehicle.max_speed, loaded.hitch.rest_distance, loaded.editor.footprint_radius
            );
            *config = loaded;
        }
        Err(e) => {
            warn!("Config: {e}; using defaults");
            *config = FarmConfig::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_other_defaults() {
        let config = FarmConfig::from_ron("(vehicle: (max_speed: 3.5), editor: (footprint_radius: 2))")
            .expect("partial config should parse");
        assert_eq!(config.vehicle.max_speed, 3.5);
        assert_eq!(config.vehicle.acceleration, 0.008);
        assert_eq!(config.editor.footprint_radius, 2);
        assert_eq!(config.hitch, HitchSettings::default());
    }

    #[test]
    fn empty_struct_is_all_defaults() {
        let config = FarmConfig::from_ron("()").expect("empty config should parse");
        assert_eq!(config, FarmConfig::default());
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = FarmConfig::from_ron("(vehicle: (max_speed: fast))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("furrow-config-does-not-exist.ron");
        let config = FarmConfig::load(&path).expect("missing file is not an error");
        assert_eq!(config, FarmConfig::default());
    }

    #[test]
    fn shipped_config_parses() {
        let text = include_str!("../../assets/config/farm.ron");
        let config = FarmConfig::from_ron(text).expect("shipped config should parse");
        assert_eq!(config.view.minimap_view_radius, 25.0);
    }
}
