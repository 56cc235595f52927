//! Vehicle domain: tractor kinematics and the towed implement.

pub mod tractor;
pub mod trailer;

pub use tractor::{CircleObstacle, MoveOutcome, VehicleBody};
pub use trailer::{HitchChange, TrailerRig};
