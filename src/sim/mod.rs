//! Plank simulation
//!
//! This module must stay pure:
//! - No storage, clock or DOM access
//! - Results depend only on the objects and the tuning passed in
//! - Object order never changes the outcome

pub mod physics;
pub mod state;

pub use physics::{PhysicsState, compute_state, compute_state_with};
pub use state::{PlacedObject, SessionState, Side};
