//! Request values and their boundary validation.
//!
//! [`GenerationParameters`] is everything that decides the shape of the
//! intensity field; [`CosmeticParameters`] is everything applied on top of it.
//! The core assumes both have passed `validate` before it runs.

use serde::{Deserialize, Serialize};

use crate::api::{GalaxyError, Point, Result};
use crate::color::ColorScheme;
use crate::post::{BloomSettings, StarFieldSettings};
use crate::sampling::{FractalSettings, LayeredNoise, NoiseParameters, MAX_OCTAVES, MIN_OCTAVES};
use crate::shapes::{require_count, require_positive, require_range, ShapeKind, ShapeParameters};

pub const MIN_DIMENSION: u32 = 100;
pub const MAX_DIMENSION: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub shape: ShapeParameters,
    pub noise: NoiseParameters,
    /// 0 disables domain warping.
    pub warp_strength: f64,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            seed: 12345,
            shape: ShapeParameters::default(),
            noise: NoiseParameters::default(),
            warp_strength: 0.3,
        }
    }
}

impl GenerationParameters {
    pub fn new(width: u32, height: u32, seed: u64, shape: ShapeParameters) -> Self {
        Self { width, height, seed, shape, ..Self::default() }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        validate_dimension("width", self.width)?;
        validate_dimension("height", self.height)?;
        self.shape.validate()?;
        match &self.noise {
            NoiseParameters::Single(settings) => validate_fractal(settings)?,
            NoiseParameters::Layered(layered) => validate_layered(layered)?,
        }
        require_range("warp_strength", self.warp_strength, 0.0, 1.0)
    }
}

fn validate_dimension(name: &'static str, value: u32) -> Result<()> {
    require_count(name, value, MIN_DIMENSION, MAX_DIMENSION)
}

fn validate_fractal(settings: &FractalSettings) -> Result<()> {
    require_count("noise.octaves", settings.octaves, MIN_OCTAVES, MAX_OCTAVES)?;
    require_positive("noise.persistence", settings.persistence)?;
    require_range("noise.persistence", settings.persistence, 0.0, 1.0)?;
    require_range("noise.lacunarity", settings.lacunarity, 1.0, 4.0)?;
    require_positive("noise.scale", settings.scale)?;
    require_range("noise.scale", settings.scale, 0.0, 100.0)
}

fn validate_layered(layered: &LayeredNoise) -> Result<()> {
    for layer in layered.layers() {
        require_positive("noise.layer.scale", layer.scale)?;
        if !(layer.weight.is_finite() && layer.weight >= 0.0) {
            return Err(GalaxyError::invalid("noise.layer.weight", format!("must be non-negative, got {}", layer.weight)));
        }
    }
    if layered.layers().iter().all(|layer| layer.weight == 0.0) {
        return Err(GalaxyError::invalid("noise.layer.weight", "at least one layer needs a positive weight"));
    }
    Ok(())
}

/// Color and post-processing applied on top of a structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CosmeticParameters {
    pub colors: ColorScheme,
    pub bloom: BloomSettings,
    pub stars: StarFieldSettings,
}

impl CosmeticParameters {
    pub fn validate(&self) -> Result<()> {
        self.bloom.validate()?;
        self.stars.validate()
    }
}
