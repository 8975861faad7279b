//! Tuning and preferences
//!
//! Persisted separately from the session snapshot, so a reset never touches them.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::Storage;

/// Constants of the torque model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsTuning {
    /// Mechanical stop, degrees either side of level
    pub max_angle: f32,
    /// Net torque per degree of tilt
    pub angle_divisor: f32,
    /// Half-width of the dead zone around the pivot (px)
    pub center_threshold: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            max_angle: MAX_ANGLE,
            angle_divisor: ANGLE_DIVISOR,
            center_threshold: CENTER_THRESHOLD,
        }
    }
}

/// How long a restore waits for the plank to be laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestorePolicy {
    /// Zero-width measurements tolerated before the restore is skipped
    pub max_attempts: u32,
    /// Pause between measurements (ms)
    pub retry_delay_ms: u32,
}

impl Default for RestorePolicy {
    fn default() -> Self {
        Self {
            max_attempts: RESTORE_MAX_ATTEMPTS,
            retry_delay_ms: RESTORE_RETRY_DELAY_MS,
        }
    }
}

/// Seesaw settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsTuning,
    pub restore: RestorePolicy,
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "seesaw_settings";

    /// Replace values that would break the model with their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = PhysicsTuning::default();
        let physics = &mut self.physics;
        if !physics.max_angle.is_finite() || physics.max_angle < 0.0 {
            physics.max_angle = defaults.max_angle;
        }
        // Zero would divide the torque into infinity
        if !physics.angle_divisor.is_finite() || physics.angle_divisor <= 0.0 {
            physics.angle_divisor = defaults.angle_divisor;
        }
        if !physics.center_threshold.is_finite() || physics.center_threshold < 0.0 {
            physics.center_threshold = defaults.center_threshold;
        }

        self.restore.max_attempts = self.restore.max_attempts.max(1);
        self.restore.retry_delay_ms = self.restore.retry_delay_ms.max(1);
        self
    }

    /// Load settings, falling back to defaults if absent or unreadable
    pub fn load(storage: &impl Storage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings.sanitized();
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings unavailable: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }
}
