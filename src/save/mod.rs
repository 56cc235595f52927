//! Field snapshots: F5 writes the terrain to `saves/field.txt`, F9 (and
//! startup, when the file exists) reads it back over the current world.
//!
//! The format is plain text. Each line is a row index followed by that
//! row's cell codes, comma separated. Rows that still match the freshly
//! generated field are omitted.

use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::*;
use crate::sim::SimulationState;
use crate::terrain::TerrainGrid;

pub const SNAPSHOT_FILE: &str = "field.txt";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: `{value}` is not a row index")]
    BadRow { line: usize, value: String },

    #[error("line {line}: row {row} is outside the field")]
    RowOutOfRange { line: usize, row: i32 },

    #[error("line {line}: expected {expected} cells, found {found}")]
    WrongWidth {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: `{value}` is not a terrain code")]
    BadCode { line: usize, value: String },

    #[error("snapshots are not available on this platform")]
    Unsupported,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ExportRequestEvent>()
            .add_event::<ImportRequestEvent>()
            .add_event::<SnapshotCompleteEvent>()
            .add_systems(OnEnter(GameState::Playing), import_on_start)
            .add_systems(
                Update,
                (
                    snapshot_keybind,
                    handle_export_request,
                    handle_import_request,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TEXT FORMAT
// ═══════════════════════════════════════════════════════════════════════

/// The field a snapshot is written against: the generated world.
pub fn baseline_field(sim: &SimulationState) -> TerrainGrid {
    TerrainGrid::generate(sim.grid.size(), &sim.structure)
}

/// Every row that differs from `baseline`, as text.
pub fn export_snapshot(grid: &TerrainGrid, baseline: &TerrainGrid) -> String {
    let mut out = String::new();
    for row in 0..grid.size() {
        let Some(cells) = grid.row(row) else {
            continue;
        };
        if baseline.row(row) == Some(cells) {
            continue;
        }
        out.push_str(&row.to_string());
        for kind in cells {
            out.push(',');
            out.push_str(&kind.code().to_string());
        }
        out.push('\n');
    }
    out
}

/// Parse a snapshot without touching any grid. Lines are numbered from 1
/// in errors; blank lines are ignored.
pub fn parse_snapshot(
    text: &str,
    size: i32,
) -> Result<Vec<(i32, Vec<TerrainKind>)>, SnapshotError> {
    let mut rows = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let mut fields = raw.split(',').map(str::trim);
        let head = fields.next().unwrap_or_default();
        let row: i32 = head.parse().map_err(|_| SnapshotError::BadRow {
            line,
            value: head.to_string(),
        })?;
        if row < 0 || row >= size {
            return Err(SnapshotError::RowOutOfRange { line, row });
        }

        let kinds = fields
            .map(|field| {
                field
                    .parse::<u8>()
                    .ok()
                    .and_then(TerrainKind::from_code)
                    .ok_or_else(|| SnapshotError::BadCode {
                        line,
                        value: field.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if kinds.len() != size as usize {
            return Err(SnapshotError::WrongWidth {
                line,
                expected: size as usize,
                found: kinds.len(),
            });
        }
        rows.push((row, kinds));
    }
    Ok(rows)
}

/// Replace the grid's terrain with the snapshot. Rows the snapshot omits
/// take the baseline's kinds; corridor cells are left alone. Nothing is
/// written unless the whole text parses. Returns the number of cells that
/// changed.
pub fn import_snapshot(
    grid: &mut TerrainGrid,
    baseline: &TerrainGrid,
    text: &str,
) -> Result<usize, SnapshotError> {
    let size = grid.size();
    let parsed = parse_snapshot(text, size)?;

    let mut rows = vec![None; size as usize];
    for (row, kinds) in parsed {
        rows[row as usize] = Some(kinds);
    }

    let mut changed = 0;
    for (row, kinds) in rows.iter().enumerate() {
        let row = row as i32;
        for col in CORRIDOR_COLS..size {
            let kind = match kinds {
                Some(k) => k[col as usize],
                None => baseline.kind(row, col).unwrap_or_default(),
            };
            if grid.set_kind(row, col, kind) {
                changed += 1;
            }
        }
    }
    Ok(changed)
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(not(target_arch = "wasm32"))]
fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

#[cfg(target_arch = "wasm32")]
fn saves_directory() -> PathBuf {
    PathBuf::from("saves")
}

pub fn snapshot_path() -> PathBuf {
    saves_directory().join(SNAPSHOT_FILE)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write_snapshot(
    path: &Path,
    grid: &TerrainGrid,
    baseline: &TerrainGrid,
) -> Result<(), SnapshotError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
    }
    // Write to a temp file first, then rename for atomicity
    let tmp_path = path.with_extension("txt.tmp");
    fs::write(&tmp_path, export_snapshot(grid, baseline)).map_err(io_error(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(io_error(path))?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn write_snapshot(
    _path: &Path,
    _grid: &TerrainGrid,
    _baseline: &TerrainGrid,
) -> Result<(), SnapshotError> {
    Err(SnapshotError::Unsupported)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_snapshot(
    path: &Path,
    grid: &mut TerrainGrid,
    baseline: &TerrainGrid,
) -> Result<usize, SnapshotError> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    import_snapshot(grid, baseline, &text)
}

#[cfg(target_arch = "wasm32")]
pub fn read_snapshot(
    _path: &Path,
    _grid: &mut TerrainGrid,
    _baseline: &TerrainGrid,
) -> Result<usize, SnapshotError> {
    Err(SnapshotError::Unsupported)
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// F5 = export, F9 = import.
fn snapshot_keybind(
    input: Res<ControlInput>,
    mut export_writer: EventWriter<ExportRequestEvent>,
    mut import_writer: EventWriter<ImportRequestEvent>,
) {
    if input.export {
        info!("F5 field export");
        export_writer.send(ExportRequestEvent);
    }
    if input.import {
        info!("F9 field import");
        import_writer.send(ImportRequestEvent);
    }
}

fn handle_export_request(
    mut requests: EventReader<ExportRequestEvent>,
    mut complete_events: EventWriter<SnapshotCompleteEvent>,
    sim: Res<SimulationState>,
) {
    for _ in requests.read() {
        let path = snapshot_path();
        match write_snapshot(&path, &sim.grid, &baseline_field(&sim)) {
            Ok(()) => {
                info!("Field exported to {}", path.display());
                complete_events.send(SnapshotCompleteEvent {
                    export: true,
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                warn!("Field export FAILED: {}", e);
                complete_events.send(SnapshotCompleteEvent {
                    export: true,
                    success: false,
                    error_message: Some(e.to_string()),
                });
            }
        }
    }
}

/// Import into the live simulation and refresh the minimap overlay.
fn apply_import(sim: &mut SimulationState, path: &Path) -> Result<usize, SnapshotError> {
    let baseline = baseline_field(sim);
    let changed = read_snapshot(path, &mut sim.grid, &baseline)?;
    let SimulationState { grid, overlay, .. } = sim;
    overlay.rebuild(grid);
    Ok(changed)
}

fn handle_import_request(
    mut requests: EventReader<ImportRequestEvent>,
    mut complete_events: EventWriter<SnapshotCompleteEvent>,
    mut sim: ResMut<SimulationState>,
) {
    for _ in requests.read() {
        let path = snapshot_path();
        match apply_import(&mut sim, &path) {
            Ok(changed) => {
                info!("Field imported from {} ({} cells changed)", path.display(), changed);
                complete_events.send(SnapshotCompleteEvent {
                    export: false,
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                warn!("Field import FAILED: {}", e);
                complete_events.send(SnapshotCompleteEvent {
                    export: false,
                    success: false,
                    error_message: Some(e.to_string()),
                });
            }
        }
    }
}

fn import_on_start(sim: Option<ResMut<SimulationState>>) {
    let Some(mut sim) = sim else {
        return;
    };
    let path = snapshot_path();
    if !path.exists() {
        return;
    }
    match apply_import(&mut sim, &path) {
        Ok(changed) => info!("Restored field from {} ({} cells)", path.display(), changed),
        Err(e) => warn!("Could not restore field from {}: {}", path.display(), e),
    }
}
