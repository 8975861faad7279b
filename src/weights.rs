//! Weight lookup tables and the queued-weight dealer

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{MAX_WEIGHT, MIN_WEIGHT};

/// Whether a weight lies in the accepted domain
#[inline]
pub fn is_valid_weight(weight: u32) -> bool {
    (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight)
}

/// Rendered diameter of a ball carrying `weight` (px)
#[inline]
pub fn ball_size(weight: u32) -> f32 {
    20.0 + 4.0 * weight as f32
}

/// Colour category of a weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightClass {
    /// 1-3
    Light,
    /// 4-6
    Medium,
    /// 7-10
    Heavy,
}

impl WeightClass {
    pub fn of(weight: u32) -> Self {
        match weight {
            0..=3 => WeightClass::Light,
            4..=6 => WeightClass::Medium,
            _ => WeightClass::Heavy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightClass::Light => "light",
            WeightClass::Medium => "medium",
            WeightClass::Heavy => "heavy",
        }
    }

    /// CSS colour of the ball
    pub fn color(&self) -> &'static str {
        match self {
            WeightClass::Light => "#4caf50",
            WeightClass::Medium => "#ff9800",
            WeightClass::Heavy => "#e53935",
        }
    }
}

/// Everything a renderer needs to paint a ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVisual {
    pub weight: u32,
    pub size: f32,
    pub class: WeightClass,
}

impl WeightVisual {
    pub fn of(weight: u32) -> Self {
        Self {
            weight,
            size: ball_size(weight),
            class: WeightClass::of(weight),
        }
    }
}

/// Deals the weight for the next placement
#[derive(Debug, Clone)]
pub struct WeightDealer {
    rng: Pcg32,
}

impl WeightDealer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform in `[MIN_WEIGHT, MAX_WEIGHT]`
    pub fn deal(&mut self) -> u32 {
        self.rng.random_range(MIN_WEIGHT..=MAX_WEIGHT)
    }
}
