//! Seesaw - a balance-beam toy
//!
//! Core modules:
//! - `sim`: Pure torque-balance physics and the live session state
//! - `persistence`: Snapshot format, storage backends and the restore protocol
//! - `controller`: The session object that ties placement, physics and saving together
//! - `platform`: Surface measurement, cancellation and browser bindings
//! - `weights`: Weight lookup tables and the queued-weight dealer
//! - `settings`: Tunable physics constants and restore policy

pub mod controller;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod weights;

pub use controller::{Placement, Seesaw};
pub use settings::{PhysicsTuning, RestorePolicy, Settings};
pub use sim::{PhysicsState, PlacedObject, Side, compute_state};

/// Physics and session constants
pub mod consts {
    /// Mechanical stop of the plank, in degrees either way
    pub const MAX_ANGLE: f32 = 30.0;
    /// Converts net torque (weight * px) into degrees
    pub const ANGLE_DIVISOR: f32 = 10.0;
    /// Objects closer than this to the pivot (px) are split between both sides
    pub const CENTER_THRESHOLD: f32 = 5.0;

    /// Weight domain (inclusive)
    pub const MIN_WEIGHT: u32 = 1;
    pub const MAX_WEIGHT: u32 = 10;

    /// Delay between surface measurements while waiting for layout (ms)
    pub const RESTORE_RETRY_DELAY_MS: u32 = 50;
    /// Surface measurements before a restore is given up (~3s at the default delay)
    pub const RESTORE_MAX_ATTEMPTS: u32 = 60;
}

/// Clamp a click position into the plank and return it with its signed offset from the pivot
#[inline]
pub fn click_to_offset(x: f32, width: f32) -> (f32, f32) {
    let width = width.max(0.0);
    let click_x = if x.is_finite() { x.clamp(0.0, width) } else { width / 2.0 };
    (click_x, click_x - width / 2.0)
}

/// Inverse of [`click_to_offset`]: place a pivot offset on a plank of `width`, clamped inside it
#[inline]
pub fn offset_to_click(offset: f32, width: f32) -> f32 {
    let width = width.max(0.0);
    (width / 2.0 + offset).clamp(0.0, width)
}
