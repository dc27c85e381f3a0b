use serde::{Deserialize, Serialize};

use super::{blend_noise, require_positive, require_range};
use crate::api::{Point, Result};

pub const NOISE_BASE: f64 = 0.8;
pub const NOISE_RANGE: f64 = 0.2;

/// Width of the central bulge as a fraction of the ring radius.
pub const CORE_EXTENT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingParams {
    pub ring_radius: f64,
    /// Standard deviation of the band around `ring_radius`, in pixels.
    pub ring_width: f64,
    /// Core brightness relative to the ring crest.
    pub core_ratio: f64,
    pub ring_intensity: f64,
}

impl Default for RingParams {
    fn default() -> Self {
        Self { ring_radius: 300.0, ring_width: 50.0, core_ratio: 0.3, ring_intensity: 1.0 }
    }
}

impl RingParams {
    pub fn validate(&self) -> Result<()> {
        require_positive("ring.ring_radius", self.ring_radius)?;
        require_positive("ring.ring_width", self.ring_width)?;
        require_range("ring.core_ratio", self.core_ratio, 0.0, 2.0)?;
        require_positive("ring.ring_intensity", self.ring_intensity)
    }
}

pub fn intensity(p: &RingParams, px: f64, py: f64, center: Point, noise: f64) -> f64 {
    let r = center.distance(px, py);

    let d = r - p.ring_radius;
    let band = (-(d * d) / (2.0 * p.ring_width * p.ring_width)).exp();

    let core_sigma = p.ring_radius * CORE_EXTENT;
    let core = p.core_ratio * (-(r * r) / (2.0 * core_sigma * core_sigma)).exp();

    let structure = p.ring_intensity * (band + core);
    (structure.clamp(0.0, 1.0) * blend_noise(noise, NOISE_BASE, NOISE_RANGE)).clamp(0.0, 1.0)
}
