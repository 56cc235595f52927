//! The towed implement and its rigid hitch.

use bevy::prelude::*;

use crate::config::HitchSettings;
use crate::shared::*;

use super::tractor::{angle_delta, frame_blend, CircleObstacle, VehicleBody};

/// The implement only swings toward the rod while the tractor moves faster
/// than this.
const ALIGN_MIN_SPEED: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitchChange {
    Attached,
    Detached,
    /// Tried to couple but the implement was out of reach.
    OutOfReach,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailerRig {
    pub position: Vec2,
    /// Degrees.
    pub angle: f32,
    pub attached: bool,
}

impl Default for TrailerRig {
    fn default() -> Self {
        Self {
            position: TRAILER_START,
            angle: TRAILER_START_ANGLE,
            attached: false,
        }
    }
}

impl TrailerRig {
    pub fn cell(&self) -> Cell {
        world_to_cell(self.position)
    }

    /// Point behind the tractor the implement couples to.
    pub fn hitch_point(tractor: &VehicleBody, settings: &HitchSettings) -> Vec2 {
        tractor.position - tractor.direction() * settings.coupling_radius
    }

    pub fn in_reach(&self, tractor: &VehicleBody, settings: &HitchSettings) -> bool {
        Self::hitch_point(tractor, settings).distance(self.position) < settings.coupling_threshold
    }

    pub fn attach(&mut self, tractor: &VehicleBody, settings: &HitchSettings) -> bool {
        if self.in_reach(tractor, settings) {
            self.attached = true;
        }
        self.attached
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn toggle(&mut self, tractor: &VehicleBody, settings: &HitchSettings) -> HitchChange {
        if self.attached {
            self.detach();
            HitchChange::Detached
        } else if self.attach(tractor, settings) {
            HitchChange::Attached
        } else {
            HitchChange::OutOfReach
        }
    }

    /// While parked the implement is a round obstacle for the tractor.
    pub fn obstacle(&self, settings: &HitchSettings) -> Option<CircleObstacle> {
        (!self.attached).then_some(CircleObstacle {
            centre: self.position,
            radius: settings.min_separation,
        })
    }

    /// Drag the implement so it sits exactly `rest_distance` from the
    /// tractor, then swing it toward the rod.
    pub fn follow(&mut self, tractor: &VehicleBody, settings: &HitchSettings, dt: f32) {
        if !self.attached {
            return;
        }
        let rod = tractor.position - self.position;
        let dist = rod.length();
        if dist <= f32::EPSILON {
            self.position = tractor.position - tractor.direction() * settings.rest_distance;
            self.angle = tractor.heading;
            return;
        }
        let dir = rod / dist;
        self.position += dir * (dist - settings.rest_distance);

        if tractor.speed.abs() > ALIGN_MIN_SPEED {
            let target = dir.y.atan2(dir.x).to_degrees();
            let k = if tractor.speed > 0.0 {
                settings.forward_alignment
            } else {
                settings.reverse_alignment
            };
            self.angle += angle_delta(self.angle, target) * frame_blend(k, dt * 60.0);
        }
    }
}
