use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{IntensityField, RenderedImage};
use crate::hashing::{CosmeticHash, StructuralHash};
use crate::params::{CosmeticParameters, GenerationParameters};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalaxyError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("computation failed: {0}")]
    ComputationFailure(String),
    #[error("cache inconsistency for {key}: {reason}")]
    CacheInconsistency { key: String, reason: String },
}

impl GalaxyError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    pub(crate) fn computation(reason: impl Into<String>) -> Self {
        Self::ComputationFailure(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, GalaxyError>;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, px: f64, py: f64) -> f64 {
        (px - self.x).hypot(py - self.y)
    }
}

/// Everything a caller gets back from a full render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub structural_hash: StructuralHash,
    pub cosmetic_hash: CosmeticHash,
    pub field: Arc<IntensityField>,
    pub image: Arc<RenderedImage>,
}

pub trait GalaxyRenderer: Send + Sync {
    fn validate(&self, params: &GenerationParameters, cosmetic: &CosmeticParameters) -> Result<()>;
    fn render(&self, params: &GenerationParameters, cosmetic: &CosmeticParameters) -> Result<RenderOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn errors_render_reason() {
        let err = GalaxyError::invalid("width", "must be at least 100");
        assert_eq!(err.to_string(), "invalid parameter `width`: must be at least 100");
    }
}
