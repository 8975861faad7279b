//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Measuring the plank surface
//! - Cancelling deferred work on reset
//! - Storage (LocalStorage on web, see `web`)

use std::cell::Cell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Reports the current laid-out width of the plank (px), zero before layout
pub trait SurfaceProbe {
    fn surface_width(&self) -> f32;
}

impl<F: Fn() -> f32> SurfaceProbe for F {
    fn surface_width(&self) -> f32 {
        self()
    }
}

/// Shared flag that tells deferred work to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    /// Whether both handles refer to the same flag
    pub fn same(&self, other: &CancelToken) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
