//! Restoring a session onto the plank
//!
//! Restored objects can only be placed once the plank has a real width. Until
//! layout happens it measures zero, and reconstructing against that would pile
//! every object onto the pivot. The task below polls the width with a bounded
//! number of retries and stops early when its token is cancelled by a reset.

use std::future::Future;

use crate::offset_to_click;
use crate::platform::{CancelToken, SurfaceProbe};
use crate::settings::RestorePolicy;
use crate::sim::PlacedObject;

/// How a wait for the surface ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceWait {
    /// The surface has a usable width
    Ready { width: f32 },
    /// Gave up after this many zero-width measurements
    Exhausted { attempts: u32 },
    /// A reset made the restore obsolete
    Cancelled,
}

/// Result of one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestoreStep {
    /// Measure again after the delay
    Retry { after_ms: u32 },
    Done(SurfaceWait),
}

/// Pending restore, polled with fresh surface measurements
#[derive(Debug, Clone)]
pub struct RestoreTask {
    policy: RestorePolicy,
    attempts: u32,
    token: CancelToken,
}

impl RestoreTask {
    pub fn new(policy: RestorePolicy, token: CancelToken) -> Self {
        Self {
            policy,
            attempts: 0,
            token,
        }
    }

    /// Zero-width measurements so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Feed one measurement of the surface width
    pub fn step(&mut self, measured_width: f32) -> RestoreStep {
        if self.token.is_cancelled() {
            return RestoreStep::Done(SurfaceWait::Cancelled);
        }
        if measured_width.is_finite() && measured_width > 0.0 {
            return RestoreStep::Done(SurfaceWait::Ready {
                width: measured_width,
            });
        }

        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            RestoreStep::Done(SurfaceWait::Exhausted {
                attempts: self.attempts,
            })
        } else {
            log::debug!(
                "Surface not laid out yet (attempt {}), retrying in {}ms",
                self.attempts,
                self.policy.retry_delay_ms
            );
            RestoreStep::Retry {
                after_ms: self.policy.retry_delay_ms,
            }
        }
    }
}

/// Poll `probe` until the surface is ready, the retries run out or the task is cancelled.
///
/// `sleep` yields to the event loop for the given number of milliseconds.
pub async fn wait_for_surface<P, S, F>(task: &mut RestoreTask, probe: &P, mut sleep: S) -> SurfaceWait
where
    P: SurfaceProbe + ?Sized,
    S: FnMut(u32) -> F,
    F: Future<Output = ()>,
{
    loop {
        match task.step(probe.surface_width()) {
            RestoreStep::Retry { after_ms } => sleep(after_ms).await,
            RestoreStep::Done(wait) => return wait,
        }
    }
}

/// Pull every object inside a plank of `width` and return their click positions.
///
/// Offsets are recomputed from the clamped positions so they stay consistent
/// with what is drawn.
pub fn reconstruct(objects: &mut [PlacedObject], width: f32) -> Vec<f32> {
    let center = width.max(0.0) / 2.0;
    objects
        .iter_mut()
        .map(|obj| {
            let click_x = offset_to_click(obj.offset, width);
            obj.offset = click_x - center;
            click_x
        })
        .collect()
}
