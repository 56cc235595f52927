//! Tractor kinematics.

use bevy::prelude::*;

use crate::config::VehicleSettings;
use crate::shared::*;

/// Degrees of turn per frame per unit of speed, before the rotation cap.
const TURN_PER_SPEED: f32 = 1.2;
/// Below this the tractor is considered stopped for steering.
const STEER_MIN_SPEED: f32 = 0.01;
/// Coasting snaps to zero under this speed.
const STOP_SNAP: f32 = 0.005;

pub const SHEET_COLUMNS: usize = 6;
pub const SHEET_ROWS: usize = 4;
pub const SHEET_FRAMES: usize = SHEET_COLUMNS * SHEET_ROWS;

/// A circular no-go zone, the parked implement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleObstacle {
    pub centre: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Ran into the structure and bounced back.
    HitStructure,
    /// Would have driven into the parked implement.
    Blocked,
    OutOfBounds,
}

/// Shortest signed difference `to - from` in degrees, in `[-180, 180]`.
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let mut diff = (to - from) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff
}

/// Per-frame blend factor `k` scaled to an arbitrary step of `frames`.
pub fn frame_blend(k: f32, frames: f32) -> f32 {
    1.0 - (1.0 - k).powf(frames)
}

/// The tractor. `heading` drives motion, `display_heading` trails it for
/// the sprite so steering looks smooth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleBody {
    pub position: Vec2,
    /// Degrees, unbounded.
    pub heading: f32,
    pub display_heading: f32,
    pub speed: f32,
}

impl Default for VehicleBody {
    fn default() -> Self {
        Self::new(TRACTOR_START, TRACTOR_START_HEADING)
    }
}

impl VehicleBody {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            display_heading: heading,
            speed: 0.0,
        }
    }

    pub fn direction(&self) -> Vec2 {
        let rad = self.heading.to_radians();
        Vec2::new(rad.cos(), rad.sin())
    }

    pub fn cell(&self) -> Cell {
        world_to_cell(self.position)
    }

    pub fn update_speed(&mut self, input: &ControlInput, settings: &VehicleSettings, dt: f32) {
        let frames = dt * 60.0;
        if input.holding(Control::Forward) {
            self.speed = (self.speed + settings.acceleration * frames).min(settings.max_speed);
        } else if input.holding(Control::Backward) {
            if self.speed > 0.0 {
                self.speed = (self.speed - settings.brake_force * frames).max(0.0);
            } else {
                self.speed =
                    (self.speed - settings.acceleration * frames).max(-settings.max_speed / 3.0);
            }
        } else {
            self.speed *= (1.0 - settings.friction * frames).max(0.0);
            if self.speed.abs() < STOP_SNAP {
                self.speed = 0.0;
            }
        }
    }

    pub fn steer(&mut self, input: &ControlInput, settings: &VehicleSettings, dt: f32) {
        if self.speed.abs() <= STEER_MIN_SPEED {
            return;
        }
        let dir = self.speed.signum();
        let turn = (self.speed.abs() * TURN_PER_SPEED).min(settings.base_rotation) * dir * dt * 60.0;
        if input.holding(Control::TurnLeft) {
            self.heading -= turn;
        }
        if input.holding(Control::TurnRight) {
            self.heading += turn;
        }
    }

    pub fn smooth_heading(&mut self, settings: &VehicleSettings, dt: f32) {
        let diff = angle_delta(self.display_heading, self.heading);
        self.display_heading += diff * frame_blend(settings.heading_smoothing, dt * 60.0);
    }

    /// Where the tractor would be after `dt` at its current speed.
    pub fn proposed(&self, dt: f32) -> Vec2 {
        self.position + self.direction() * self.speed * dt * 60.0
    }

    /// Try to move. Checks run structure first, then the parked implement,
    /// then the world edge; the first hit rejects the move.
    pub fn advance(
        &mut self,
        dt: f32,
        structure: &Structure,
        parked: Option<CircleObstacle>,
        limit: f32,
    ) -> MoveOutcome {
        let next = self.proposed(dt);

        if structure.contains(next) {
            self.speed = -self.speed * 0.5;
            return MoveOutcome::HitStructure;
        }

        if let Some(obstacle) = parked {
            let next_dist = next.distance(obstacle.centre);
            if next_dist < obstacle.radius && next_dist < self.position.distance(obstacle.centre) {
                self.speed *= 0.5;
                return MoveOutcome::Blocked;
            }
        }

        if next.x < 0.0 || next.y < 0.0 || next.x > limit || next.y > limit {
            self.speed *= 0.5;
            return MoveOutcome::OutOfBounds;
        }

        self.position = next;
        MoveOutcome::Moved
    }

    /// One full step: speed, steering, display smoothing, movement.
    pub fn integrate(
        &mut self,
        input: &ControlInput,
        settings: &VehicleSettings,
        dt: f32,
        structure: &Structure,
        parked: Option<CircleObstacle>,
    ) -> MoveOutcome {
        self.update_speed(input, settings, dt);
        self.steer(input, settings, dt);
        self.smooth_heading(settings, dt);
        let limit = (MAP_SIZE - 1) as f32 * TILE_SIZE;
        self.advance(dt, structure, parked, limit)
    }

    /// Sprite sheet frame for the smoothed heading. Frame 0 faces screen-up,
    /// frames step clockwise by 15 degrees.
    pub fn sprite_frame(&self) -> usize {
        let h = self.display_heading.rem_euclid(360.0);
        let facing = (90.0 - h).rem_euclid(360.0);
        ((facing + 7.5) / 15.0).floor() as usize % SHEET_FRAMES
    }

    pub fn speed_kmh(&self, settings: &VehicleSettings) -> f32 {
        if settings.max_speed <= 0.0 {
            return 0.0;
        }
        self.speed.abs() / settings.max_speed * settings.max_speed_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn open_field() -> Structure {
        Structure {
            col: 0,
            row: 0,
            width: 0,
            height: 0,
        }
    }

    #[test]
    fn speed_rises_to_cap_then_decays_to_exactly_zero() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::new(1000.0, 1000.0), 45.0);
        let forward = ControlInput::with_held(&[Control::Forward]);
        let idle = ControlInput::default();

        let mut last = 0.0;
        for _ in 0..60 {
            body.update_speed(&forward, &settings, DT);
            assert!(body.speed > last, "speed should keep rising while under the cap");
            last = body.speed;
        }
        assert!((body.speed - 0.48).abs() < 1e-3, "60 frames at 0.008/frame, got {}", body.speed);

        for _ in 0..600 {
            body.update_speed(&forward, &settings, DT);
        }
        assert_eq!(body.speed, settings.max_speed);

        let mut frames = 0;
        while body.speed != 0.0 {
            let before = body.speed;
            body.update_speed(&idle, &settings, DT);
            assert!(body.speed < before, "coasting must strictly slow down");
            frames += 1;
            assert!(frames < 2000, "never came to rest");
        }
        for _ in 0..120 {
            body.update_speed(&idle, &settings, DT);
            assert_eq!(body.speed, 0.0, "resting speed must not drift");
        }
    }

    #[test]
    fn reverse_is_capped_at_a_third_of_max() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::new(2000.0, 1000.0), 0.0);
        let back = ControlInput::with_held(&[Control::Backward]);
        for _ in 0..2000 {
            body.integrate(&back, &settings, DT, &open_field(), None);
        }
        assert!((body.speed + settings.max_speed / 3.0).abs() < 1e-6);
        assert!(body.position.x < 2000.0);
    }

    #[test]
    fn backward_brakes_before_reversing() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::new(1000.0, 1000.0), 0.0);
        body.speed = 1.0;
        let back = ControlInput::with_held(&[Control::Backward]);
        body.update_speed(&back, &settings, DT);
        assert!((body.speed - 0.96).abs() < 1e-6);
        body.speed = 0.01;
        body.update_speed(&back, &settings, DT);
        assert_eq!(body.speed, 0.0, "braking stops at zero within the same frame");
    }

    #[test]
    fn frame_rate_does_not_change_the_outcome() {
        let settings = VehicleSettings::default();
        let forward = ControlInput::with_held(&[Control::Forward]);
        let mut fast = VehicleBody::new(Vec2::new(1000.0, 1000.0), 0.0);
        let mut slow = fast;
        for _ in 0..120 {
            fast.update_speed(&forward, &settings, 1.0 / 120.0);
        }
        for _ in 0..30 {
            slow.update_speed(&forward, &settings, 1.0 / 30.0);
        }
        assert!((fast.speed - slow.speed).abs() < 1e-4);
    }

    #[test]
    fn steering_needs_motion_and_flips_in_reverse() {
        let settings = VehicleSettings::default();
        let right = ControlInput::with_held(&[Control::TurnRight]);
        let mut body = VehicleBody::new(Vec2::new(1000.0, 1000.0), 0.0);
        body.steer(&right, &settings, DT);
        assert_eq!(body.heading, 0.0, "no turning while stopped");

        body.speed = 2.0;
        body.steer(&right, &settings, DT);
        assert!((body.heading - 1.2).abs() < 1e-5, "turn rate capped at 1.2");

        body.heading = 0.0;
        body.speed = -0.5;
        body.steer(&right, &settings, DT);
        assert!((body.heading + 0.6).abs() < 1e-5, "reverse steering is mirrored");
    }

    #[test]
    fn display_heading_takes_the_short_way_round() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::ZERO, 350.0);
        body.heading = 370.0;
        body.smooth_heading(&settings, DT);
        assert!((body.display_heading - 355.0).abs() < 1e-4);

        body.display_heading = 10.0;
        body.heading = -10.0;
        body.smooth_heading(&settings, DT);
        assert!((body.display_heading - 5.0).abs() < 1e-4);
    }

    #[test]
    fn structure_hit_bounces_without_moving() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::new(SHED.col as f32 * TILE_SIZE - 1.0, 750.0), 0.0);
        body.speed = 2.0;
        let start = body.position;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &SHED, None);
        assert_eq!(outcome, MoveOutcome::HitStructure);
        assert_eq!(body.position, start);
        assert!(body.speed < 0.0, "bounce reverses direction");
    }

    #[test]
    fn world_edge_halves_speed() {
        let settings = VehicleSettings::default();
        let mut body = VehicleBody::new(Vec2::new(0.5, 500.0), 180.0);
        body.speed = 2.0;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &open_field(), None);
        assert_eq!(outcome, MoveOutcome::OutOfBounds);
        assert_eq!(body.position, Vec2::new(0.5, 500.0));
        assert!(body.speed > 0.0 && body.speed < 1.0);
    }

    #[test]
    fn parked_implement_blocks_approach_but_not_escape() {
        let settings = VehicleSettings::default();
        let parked = CircleObstacle {
            centre: Vec2::new(1029.0, 1000.0),
            radius: 28.0,
        };
        let mut body = VehicleBody::new(Vec2::new(1000.0, 1000.0), 0.0);
        body.speed = 2.0;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &open_field(), Some(parked));
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert!(body.speed > 0.0, "no bounce off the implement");

        body.heading = 180.0;
        body.speed = 2.0;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &open_field(), Some(parked));
        assert_eq!(outcome, MoveOutcome::Moved);
    }

    #[test]
    fn tractor_inside_the_separation_can_only_back_away() {
        let settings = VehicleSettings::default();
        let parked = CircleObstacle {
            centre: Vec2::new(1010.0, 1000.0),
            radius: 28.0,
        };
        let mut body = VehicleBody::new(Vec2::new(1000.0, 1000.0), 0.0);
        body.speed = 1.0;
        let start = body.position;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &open_field(), Some(parked));
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(body.position, start);

        body.heading = 180.0;
        body.speed = 1.0;
        let outcome = body.integrate(&ControlInput::default(), &settings, DT, &open_field(), Some(parked));
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!(body.position.distance(parked.centre) > 10.0);
        assert!(body.position.distance(parked.centre) < 28.0, "still inside, yet free to leave");
    }

    #[test]
    fn sprite_frames_follow_heading() {
        let mut body = VehicleBody::new(Vec2::ZERO, 90.0);
        assert_eq!(body.sprite_frame(), 0);
        body.display_heading = 75.0;
        assert_eq!(body.sprite_frame(), 1);
        body.display_heading = 45.0;
        assert_eq!(body.sprite_frame(), 3);
        body.display_heading = -270.0;
        assert_eq!(body.sprite_frame(), 0);
        body.display_heading = 97.0;
        assert_eq!(body.sprite_frame(), 0, "within half a step of screen-up");
        body.display_heading = 100.0;
        assert_eq!(body.sprite_frame(), 23);
    }
}
