//! Placed objects and the live session state
//!
//! The snapshot in `persistence` is the durable form of [`SessionState`].

use serde::{Deserialize, Serialize};

/// Which side of the pivot an object bears on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    /// Within the dead zone, supported equally by both halves
    Center,
    Right,
}

impl Side {
    pub fn classify(offset: f32, center_threshold: f32) -> Self {
        if offset.abs() < center_threshold {
            Side::Center
        } else if offset < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Center => "center",
            Side::Right => "right",
        }
    }
}

/// A weight resting on the plank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub weight: u32,
    /// Signed distance from the pivot (px), negative to the left
    pub offset: f32,
}

impl PlacedObject {
    pub fn new(weight: u32, offset: f32) -> Self {
        Self { weight, offset }
    }

    /// Unsigned distance from the pivot
    #[inline]
    pub fn distance(&self) -> f32 {
        self.offset.abs()
    }

    pub fn side(&self, center_threshold: f32) -> Side {
        Side::classify(self.offset, center_threshold)
    }
}

/// Everything that makes up a session, owned by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Objects in placement order
    pub objects: Vec<PlacedObject>,
    /// Weight for the next placement
    pub queued_weight: u32,
    /// Tilt from the latest recompute (degrees)
    pub last_angle: f32,
}

impl SessionState {
    /// An empty plank
    pub fn new(queued_weight: u32) -> Self {
        Self {
            objects: Vec::new(),
            queued_weight,
            last_angle: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
