use serde::{Deserialize, Serialize};

use super::{blend_noise, require_positive, require_range};
use crate::api::{GalaxyError, Point, Result};

/// Ellipticals are smooth; noise only roughens them slightly.
pub const NOISE_BASE: f64 = 0.7;
pub const NOISE_RANGE: f64 = 0.3;

pub const MIN_SERSIC_INDEX: f64 = 0.5;
pub const MAX_SERSIC_INDEX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalParams {
    /// Half-light radius along the major axis, in pixels.
    pub effective_radius: f64,
    pub sersic_index: f64,
    /// Minor over major axis, in (0, 1].
    pub axis_ratio: f64,
    /// Major axis angle from +x, in radians.
    pub orientation: f64,
}

impl Default for EllipticalParams {
    fn default() -> Self {
        Self { effective_radius: 200.0, sersic_index: 4.0, axis_ratio: 0.7, orientation: 0.5 }
    }
}

impl EllipticalParams {
    pub fn validate(&self) -> Result<()> {
        require_positive("elliptical.effective_radius", self.effective_radius)?;
        require_range("elliptical.sersic_index", self.sersic_index, MIN_SERSIC_INDEX, MAX_SERSIC_INDEX)?;
        require_positive("elliptical.axis_ratio", self.axis_ratio)?;
        require_range("elliptical.axis_ratio", self.axis_ratio, 0.0, 1.0)?;
        if !self.orientation.is_finite() {
            return Err(GalaxyError::invalid("elliptical.orientation", "must be finite"));
        }
        Ok(())
    }
}

/// Ciotti & Bertin style approximation of the Sersic `b_n` constant.
pub fn sersic_b(n: f64) -> f64 {
    2.0 * n - 1.0 / 3.0 + 0.009876 / n
}

pub fn intensity(p: &EllipticalParams, px: f64, py: f64, center: Point, noise: f64) -> f64 {
    let dx = px - center.x;
    let dy = py - center.y;
    let (sin, cos) = p.orientation.sin_cos();
    let major = dx * cos + dy * sin;
    let minor = -dx * sin + dy * cos;
    let r = major.hypot(minor / p.axis_ratio);

    let n = p.sersic_index;
    let profile = (-sersic_b(n) * (r / p.effective_radius).powf(1.0 / n)).exp();
    (profile * blend_noise(noise, NOISE_BASE, NOISE_RANGE)).clamp(0.0, 1.0)
}
