//! Intensity strategies, one per galaxy family.
//!
//! Each family has its own parameter struct. [`ShapeKernel`] is prepared once
//! per structure (seed-derived layouts are laid out here) and afterwards only
//! read, so `intensity` can run on any number of threads at once.

pub mod elliptical;
pub mod irregular;
pub mod ring;
pub mod spiral;
pub mod voronoi;

use serde::{Deserialize, Serialize};

use crate::api::{GalaxyError, Point, Result};

pub use elliptical::EllipticalParams;
pub use irregular::{IrregularLayout, IrregularParams};
pub use ring::RingParams;
pub use spiral::SpiralParams;
pub use voronoi::{ClusterLayout, VoronoiParams};

/// Distances below this count as the galaxy center.
pub const CENTER_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Spiral,
    VoronoiCluster,
    Elliptical,
    Ring,
    Irregular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeParameters {
    Spiral(SpiralParams),
    VoronoiCluster(VoronoiParams),
    Elliptical(EllipticalParams),
    Ring(RingParams),
    Irregular(IrregularParams),
}

impl Default for ShapeParameters {
    fn default() -> Self {
        ShapeParameters::Spiral(SpiralParams::default())
    }
}

impl ShapeParameters {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeParameters::Spiral(_) => ShapeKind::Spiral,
            ShapeParameters::VoronoiCluster(_) => ShapeKind::VoronoiCluster,
            ShapeParameters::Elliptical(_) => ShapeKind::Elliptical,
            ShapeParameters::Ring(_) => ShapeKind::Ring,
            ShapeParameters::Irregular(_) => ShapeKind::Irregular,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ShapeParameters::Spiral(p) => p.validate(),
            ShapeParameters::VoronoiCluster(p) => p.validate(),
            ShapeParameters::Elliptical(p) => p.validate(),
            ShapeParameters::Ring(p) => p.validate(),
            ShapeParameters::Irregular(p) => p.validate(),
        }
    }
}

/// A shape ready for per-pixel evaluation.
#[derive(Debug, Clone)]
pub enum ShapeKernel {
    Spiral(SpiralParams),
    VoronoiCluster(VoronoiParams, ClusterLayout),
    Elliptical(EllipticalParams),
    Ring(RingParams),
    Irregular(IrregularParams, IrregularLayout),
}

impl ShapeKernel {
    pub fn prepare(shape: &ShapeParameters, seed: u64) -> Self {
        match shape {
            ShapeParameters::Spiral(p) => ShapeKernel::Spiral(*p),
            ShapeParameters::VoronoiCluster(p) => ShapeKernel::VoronoiCluster(*p, ClusterLayout::generate(p, seed)),
            ShapeParameters::Elliptical(p) => ShapeKernel::Elliptical(*p),
            ShapeParameters::Ring(p) => ShapeKernel::Ring(*p),
            ShapeParameters::Irregular(p) => ShapeKernel::Irregular(*p, IrregularLayout::generate(p, seed)),
        }
    }

    /// Brightness in [0, 1] at `(px, py)` for a galaxy centered on `center`.
    #[inline]
    pub fn intensity(&self, px: f64, py: f64, center: Point, noise: f64) -> f64 {
        match self {
            ShapeKernel::Spiral(p) => spiral::intensity(p, px, py, center, noise),
            ShapeKernel::VoronoiCluster(p, layout) => voronoi::intensity(p, layout, px, py, center, noise),
            ShapeKernel::Elliptical(p) => elliptical::intensity(p, px, py, center, noise),
            ShapeKernel::Ring(p) => ring::intensity(p, px, py, center, noise),
            ShapeKernel::Irregular(p, layout) => irregular::intensity(p, layout, px, py, center, noise),
        }
    }
}

/// `base + noise * range`, the noise modulation every family applies last.
#[inline]
pub(crate) fn blend_noise(noise: f64, base: f64, range: f64) -> f64 {
    base + noise.clamp(0.0, 1.0) * range
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GalaxyError::invalid(name, format!("must be a positive number, got {value}")))
    }
}

pub(crate) fn require_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GalaxyError::invalid(name, format!("must be within [{min}, {max}], got {value}")))
    }
}

pub(crate) fn require_count(name: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GalaxyError::invalid(name, format!("must be within {min}..={max}, got {value}")))
    }
}
