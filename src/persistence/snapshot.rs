//! Session snapshot format
//!
//! ```json
//! { "queuedWeight": 4, "lastAngle": -16.0,
//!   "objects": [{ "weight": 6, "offset": -40.0 }, { "weight": 4, "offset": 20.0 }] }
//! ```
//!
//! Offsets are stored raw (px from the pivot). The header fields are optional
//! and fall back individually; the object list is accepted whole or not at all.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::storage::{Storage, StorageError};
use crate::settings::PhysicsTuning;
use crate::sim::{PlacedObject, SessionState};
use crate::weights::{WeightDealer, is_valid_weight};

/// Storage key; the suffix versions the schema
pub const STORAGE_KEY: &str = "seesaw_state_v4";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("object {index} has weight {weight}, outside the accepted range")]
    WeightOutOfRange { index: usize, weight: u32 },
    #[error("object {index} has a non-finite offset")]
    NonFiniteOffset { index: usize },
}

/// Durable form of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub queued_weight: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_angle: Option<f32>,
    pub objects: Vec<PlacedObject>,
}

/// Present but mistyped reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Snapshot {
    pub fn capture(session: &SessionState) -> Self {
        Self {
            queued_weight: Some(session.queued_weight),
            last_angle: Some(session.last_angle),
            objects: session.objects.clone(),
        }
    }

    /// Parse and validate
    pub fn parse(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        for (index, obj) in self.objects.iter().enumerate() {
            if !is_valid_weight(obj.weight) {
                return Err(SnapshotError::WeightOutOfRange {
                    index,
                    weight: obj.weight,
                });
            }
            if !obj.offset.is_finite() {
                return Err(SnapshotError::NonFiniteOffset { index });
            }
        }
        Ok(())
    }

    /// Turn into a live session, filling in whatever the header lacked
    pub fn into_session(self, tuning: &PhysicsTuning, dealer: &mut WeightDealer) -> SessionState {
        let queued_weight = self
            .queued_weight
            .filter(|&w| is_valid_weight(w))
            .unwrap_or_else(|| dealer.deal());
        let last_angle = self
            .last_angle
            .filter(|a| a.is_finite())
            .map(|a| a.clamp(-tuning.max_angle, tuning.max_angle))
            .unwrap_or(0.0);

        SessionState {
            objects: self.objects,
            queued_weight,
            last_angle,
        }
    }

    /// Read the stored snapshot. Absent, unreadable and malformed all yield `None`.
    pub fn load(storage: &impl Storage) -> Option<Self> {
        let json = match storage.get(STORAGE_KEY) {
            Ok(json) => json?,
            Err(e) => {
                log::warn!("Session storage unavailable: {}", e);
                return None;
            }
        };

        match Self::parse(&json) {
            Ok(snapshot) => {
                log::info!("Loaded session with {} objects", snapshot.objects.len());
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("Discarding stored session: {}", e);
                None
            }
        }
    }

    pub fn save(&self, storage: &impl Storage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).map_err(|e| StorageError::WriteFailed {
            key: STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        storage.set(STORAGE_KEY, &json)
    }

    pub fn clear(storage: &impl Storage) -> Result<(), StorageError> {
        storage.remove(STORAGE_KEY)
    }
}
