//! Torque balance
//!
//! Each object pushes its side down with `weight * distance`. The net moment,
//! scaled by the angle divisor and clamped at the mechanical stop, is the tilt.

use super::state::{PlacedObject, Side};
use crate::settings::PhysicsTuning;

/// Loads and tilt derived from the objects on the plank
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsState {
    /// Weight borne by the left half
    pub left_load: f32,
    /// Weight borne by the right half
    pub right_load: f32,
    pub left_torque: f32,
    pub right_torque: f32,
    /// Tilt in degrees, positive when the right side goes down
    pub angle: f32,
}

impl PhysicsState {
    /// Positive when the right side dominates
    #[inline]
    pub fn net_torque(&self) -> f32 {
        self.right_torque - self.left_torque
    }

    #[inline]
    pub fn total_load(&self) -> f32 {
        self.left_load + self.right_load
    }
}

/// Compute loads and tilt with the default constants
pub fn compute_state(objects: &[PlacedObject]) -> PhysicsState {
    compute_state_with(objects, &PhysicsTuning::default())
}

/// Compute loads and tilt
pub fn compute_state_with(objects: &[PlacedObject], tuning: &PhysicsTuning) -> PhysicsState {
    let mut state = PhysicsState::default();

    for obj in objects {
        let weight = obj.weight as f32;
        let d = obj.distance();

        match obj.side(tuning.center_threshold) {
            Side::Center => {
                state.left_load += weight / 2.0;
                state.right_load += weight / 2.0;
            }
            Side::Left => {
                state.left_load += weight;
                state.left_torque += weight * d;
            }
            Side::Right => {
                state.right_load += weight;
                state.right_torque += weight * d;
            }
        }
    }

    let raw_angle = state.net_torque() / tuning.angle_divisor;
    state.angle = raw_angle.clamp(-tuning.max_angle, tuning.max_angle);
    state
}
