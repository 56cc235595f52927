//! Simulation domain: the per-frame tick.
//!
//! `SimulationState` owns everything that changes during play. The Bevy
//! system at the bottom only feeds it a clamped `dt` and the frame's
//! input, then forwards what changed as events.

use bevy::prelude::*;

use crate::config::FarmConfig;
use crate::farming::{overlay::cell_colour, FarmEditor, MinimapOverlay};
use crate::iso::{IsoCamera, IsoProjector};
use crate::shared::*;
use crate::terrain::TerrainGrid;
use crate::vehicle::{HitchChange, TrailerRig, VehicleBody};

/// Longest step the driver will hand to `tick`.
pub const MAX_DT: f32 = 0.1;

/// What a single tick did, for the caller to log or forward.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub changed: Vec<(Cell, TerrainKind)>,
    pub hitch: Option<HitchChange>,
    pub tool_switched: Option<Tool>,
}

#[derive(Resource, Debug, Clone)]
pub struct SimulationState {
    pub grid: TerrainGrid,
    pub overlay: MinimapOverlay,
    pub tractor: VehicleBody,
    pub trailer: TrailerRig,
    pub editor: FarmEditor,
    pub tool: Tool,
    pub structure: Structure,
    pub projector: IsoProjector,
    /// Main view size in pixels.
    pub viewport: Vec2,
    pub config: FarmConfig,
}

impl SimulationState {
    /// Fresh world at the fixed starting poses.
    pub fn new(config: FarmConfig) -> Self {
        let grid = TerrainGrid::generate(MAP_SIZE, &SHED);
        let overlay = MinimapOverlay::from_grid(&grid);
        Self {
            grid,
            overlay,
            tractor: VehicleBody::default(),
            trailer: TrailerRig::default(),
            editor: FarmEditor::new(config.editor.footprint_radius),
            tool: Tool::default(),
            structure: SHED,
            projector: IsoProjector::default(),
            viewport: Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            config,
        }
    }

    pub fn camera(&self) -> IsoCamera {
        IsoCamera::follow(&self.projector, self.tractor.position, self.viewport)
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32, input: &ControlInput) -> TickReport {
        let mut report = TickReport {
            changed: Vec::new(),
            hitch: None,
            tool_switched: None,
        };

        if input.toggle_tool {
            self.tool = self.tool.toggled();
            report.tool_switched = Some(self.tool);
        }
        if input.toggle_hitch {
            report.hitch = Some(self.trailer.toggle(&self.tractor, &self.config.hitch));
        }

        let parked = self.trailer.obstacle(&self.config.hitch);
        self.tractor
            .integrate(input, &self.config.vehicle, dt, &self.structure, parked);
        self.trailer.follow(&self.tractor, &self.config.hitch, dt);

        if self.trailer.attached {
            let changed = self.editor.stamp(
                &mut self.grid,
                &mut self.overlay,
                self.trailer.cell(),
                self.tool,
            );
            report.changed.extend(changed);
        }

        if let Some(pointer) = input.paint_click {
            report.changed.extend(self.paint_at(pointer));
        }

        report
    }

    /// Lay gravel under a viewport pixel.
    pub fn paint_at(&mut self, viewport_px: Vec2) -> Vec<(Cell, TerrainKind)> {
        let screen = self.camera().to_screen(viewport_px);
        let (row, col) = self.projector.to_grid(screen);
        let changes = self.grid.paint_road(row, col);
        for &((r, c), kind) in &changes {
            self.overlay
                .write(r, c, cell_colour(kind, self.grid.is_wooded(r, c)));
        }
        changes
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControlInput>()
            .init_resource::<FarmConfig>()
            .add_event::<TileChangedEvent>()
            .add_systems(
                OnEnter(GameState::Loading),
                build_world.after(crate::config::load_config),
            )
            .add_systems(
                Update,
                drive_simulation.run_if(in_state(GameState::Playing)),
            );
    }
}

fn build_world(
    mut commands: Commands,
    config: Res<FarmConfig>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    commands.insert_resource(SimulationState::new(config.clone()));
    next_state.set(GameState::Playing);
}

fn drive_simulation(
    time: Res<Time>,
    input: Res<ControlInput>,
    mut sim: ResMut<SimulationState>,
    mut tile_events: EventWriter<TileChangedEvent>,
) {
    let dt = time.delta_secs().min(MAX_DT);
    let report = sim.tick(dt, &input);

    if let Some(tool) = report.tool_switched {
        info!("Implement switched to {}", tool.label());
    }
    match report.hitch {
        Some(HitchChange::Attached) => info!("Implement coupled"),
        Some(HitchChange::Detached) => info!("Implement uncoupled"),
        Some(HitchChange::OutOfReach) => debug!("Implement out of reach"),
        None => {}
    }

    for ((row, col), kind) in report.changed {
        tile_events.send(TileChangedEvent { row, col, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn hitched() -> SimulationState {
        let mut sim = SimulationState::new(FarmConfig::default());
        // Open field well clear of the road and shed.
        sim.tractor = VehicleBody::new(Vec2::new(1500.0, 1500.0), 0.0);
        sim.trailer.position = Vec2::new(1465.0, 1500.0);
        let report = sim.tick(
            DT,
            &ControlInput {
                toggle_hitch: true,
                ..Default::default()
            },
        );
        assert_eq!(report.hitch, Some(HitchChange::Attached));
        sim
    }

    #[test]
    fn coupling_stamps_the_footprint_immediately() {
        let sim = hitched();
        let (row, col) = sim.trailer.cell();
        assert_eq!(sim.grid.kind(row, col), Some(TerrainKind::Dirt));
        assert_eq!(sim.editor.last_cell(), Some((row, col)));
    }

    #[test]
    fn driving_with_the_plow_leaves_a_dirt_track() {
        let mut sim = hitched();
        let forward = ControlInput::with_held(&[Control::Forward]);
        let mut changed = 0;
        for _ in 0..300 {
            changed += sim.tick(DT, &forward).changed.len();
        }
        assert!(changed > 49, "expected several stamps, got {changed} cells");
        let (row, col) = sim.trailer.cell();
        assert_eq!(sim.grid.kind(row, col), Some(TerrainKind::Dirt));
        assert!(sim.tractor.position.x > 1500.0);
    }

    #[test]
    fn planter_follows_the_plow() {
        let mut sim = hitched();
        let start = sim.trailer.cell();
        let planter = ControlInput {
            toggle_tool: true,
            ..Default::default()
        };
        let report = sim.tick(DT, &planter);
        assert_eq!(report.tool_switched, Some(Tool::Planter));

        // Drive on so the planter footprint sweeps over the plowed cells.
        let forward = ControlInput::with_held(&[Control::Forward]);
        for _ in 0..120 {
            sim.tick(DT, &forward);
        }
        assert_eq!(sim.grid.kind(start.0, start.1 + 3), Some(TerrainKind::Planted));
    }

    #[test]
    fn parked_implement_does_not_farm() {
        let mut sim = SimulationState::new(FarmConfig::default());
        let before = sim.grid.clone();
        let forward = ControlInput::with_held(&[Control::Forward]);
        for _ in 0..120 {
            let report = sim.tick(DT, &forward);
            assert!(report.changed.is_empty());
        }
        assert_eq!(sim.grid, before);
    }

    #[test]
    fn right_click_paints_road_under_the_pointer() {
        let mut sim = SimulationState::new(FarmConfig::default());
        let centre = sim.viewport / 2.0;
        let target = sim.projector.to_grid(sim.camera().to_screen(centre));
        assert_eq!(target, sim.tractor.cell());

        let report = sim.tick(
            DT,
            &ControlInput {
                paint_click: Some(centre),
                ..Default::default()
            },
        );
        assert_eq!(report.changed.first(), Some(&(target, TerrainKind::GravelRoad)));
        assert_eq!(sim.grid.kind(target.0, target.1), Some(TerrainKind::GravelRoad));
        assert_eq!(
            sim.overlay.pixel(target.0, target.1),
            Some(crate::farming::overlay::ROAD_COLOUR)
        );
    }
}
