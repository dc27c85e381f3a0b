use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::{blend_noise, require_count, require_positive, CENTER_EPSILON};
use crate::api::{GalaxyError, Point, Result};

pub const NOISE_BASE: f64 = 0.3;
pub const NOISE_RANGE: f64 = 0.7;

/// Disk brightness between arms, relative to an arm crest.
pub const INTER_ARM_FLOOR: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiralParams {
    /// Galaxy radius in pixels; the disk fades to zero here.
    pub radius: f64,
    pub arm_count: u32,
    /// Angular half-width of an arm, in radians.
    pub arm_width: f64,
    /// Winding of the logarithmic spiral; larger values wrap tighter.
    pub arm_rotation: f64,
    /// Exponential decay rate of the core over normalized radius.
    pub core_falloff: f64,
    pub core_brightness: f64,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            radius: 400.0,
            arm_count: 2,
            arm_width: 0.35,
            arm_rotation: 4.0,
            core_falloff: 8.0,
            core_brightness: 1.2,
        }
    }
}

impl SpiralParams {
    pub fn validate(&self) -> Result<()> {
        require_positive("spiral.radius", self.radius)?;
        require_count("spiral.arm_count", self.arm_count, 1, 12)?;
        require_positive("spiral.arm_width", self.arm_width)?;
        require_positive("spiral.core_falloff", self.core_falloff)?;
        require_positive("spiral.core_brightness", self.core_brightness)?;
        if !self.arm_rotation.is_finite() {
            return Err(GalaxyError::invalid("spiral.arm_rotation", "must be finite"));
        }
        Ok(())
    }
}

pub fn intensity(p: &SpiralParams, px: f64, py: f64, center: Point, noise: f64) -> f64 {
    let dx = px - center.x;
    let dy = py - center.y;
    let r = dx.hypot(dy) / p.radius;

    let disk = if r < 1.0 { (1.0 - r).powi(2) } else { 0.0 };
    let arms = arm_membership(p, dx, dy, r);
    let core = (-r * p.core_falloff).exp() * p.core_brightness;

    let structure = disk * (INTER_ARM_FLOOR + (1.0 - INTER_ARM_FLOOR) * arms) + core;
    (structure * blend_noise(noise, NOISE_BASE, NOISE_RANGE)).clamp(0.0, 1.0)
}

/// 1.0 on an arm crest, falling off as a Gaussian in angle away from it.
fn arm_membership(p: &SpiralParams, dx: f64, dy: f64, r: f64) -> f64 {
    if r < CENTER_EPSILON {
        return 1.0;
    }
    let arms = p.arm_count as f64;
    let theta = dy.atan2(dx);
    // Along an arm theta - rotation * ln(r) is constant.
    let phase = ((theta - p.arm_rotation * r.ln()) * arms).rem_euclid(TAU);
    let angular = phase.min(TAU - phase) / arms;
    (-(angular * angular) / (2.0 * p.arm_width * p.arm_width)).exp()
}
