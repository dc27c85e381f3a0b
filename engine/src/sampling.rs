//! Seeded fractal Perlin noise over a pixel grid.
//!
//! Raw fBm sums are accumulated for every pixel first, then rescaled to
//! [0, 1] with the observed min/max. The rescale never starts before the
//! min/max reduction has seen the whole grid.

use noise::{NoiseFn, Perlin};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{GalaxyError, Result};
use crate::field::NormalizedNoiseGrid;

pub const MIN_OCTAVES: u32 = 1;
pub const MAX_OCTAVES: u32 = 10;

/// Noise cycles across the shorter image side at scale 1.0.
pub const FEATURE_FREQUENCY: f64 = 10.0;

/// Octaves per layer in layered mode; each layer is its own fBm field.
pub const LAYER_OCTAVES: u32 = 4;
pub const LAYER_PERSISTENCE: f64 = 0.5;
pub const LAYER_LACUNARITY: f64 = 2.0;

/// Value given to every pixel when the raw field is perfectly flat.
pub const FLAT_FIELD_VALUE: f64 = 0.5;

/// Classic single-layer fBm settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalSettings {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub scale: f64,
}

impl Default for FractalSettings {
    fn default() -> Self {
        Self { octaves: 4, persistence: 0.5, lacunarity: 2.0, scale: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayer {
    pub scale: f64,
    pub weight: f64,
}

/// Three independent fBm fields at coarse, medium and fine scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayeredNoise {
    pub macro_layer: NoiseLayer,
    pub meso_layer: NoiseLayer,
    pub micro_layer: NoiseLayer,
}

impl Default for LayeredNoise {
    fn default() -> Self {
        Self {
            macro_layer: NoiseLayer { scale: 0.2, weight: 0.6 },
            meso_layer: NoiseLayer { scale: 0.8, weight: 0.3 },
            micro_layer: NoiseLayer { scale: 3.0, weight: 0.1 },
        }
    }
}

impl LayeredNoise {
    pub fn layers(&self) -> [NoiseLayer; 3] {
        [self.macro_layer, self.meso_layer, self.micro_layer]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoiseParameters {
    Single(FractalSettings),
    Layered(LayeredNoise),
}

impl Default for NoiseParameters {
    fn default() -> Self {
        NoiseParameters::Single(FractalSettings::default())
    }
}

/// Folds a 64-bit seed into the 32 bits `noise::Perlin` accepts.
///
/// The fold is lossy: seeds whose halves xor to the same value (e.g. `1` and
/// `1 << 32`) share a noise field. Shape layouts and star fields are seeded
/// from all 64 bits, so such seeds still produce different galaxies.
pub fn perlin_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

struct Fbm {
    perlin: Perlin,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    frequency: f64,
}

impl Fbm {
    fn new(seed: u32, octaves: u32, persistence: f64, lacunarity: f64, frequency: f64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            octaves: octaves.clamp(MIN_OCTAVES, MAX_OCTAVES),
            persistence,
            lacunarity,
            frequency,
        }
    }

    fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        for _ in 0..self.octaves {
            total += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }
        total
    }
}

/// Base frequency in noise units per pixel for a given `scale`.
fn pixel_frequency(width: u32, height: u32, scale: f64) -> f64 {
    scale * FEATURE_FREQUENCY / width.min(height).max(1) as f64
}

/// Single-layer fBm grid.
pub fn generate(seed: u64, width: u32, height: u32, settings: &FractalSettings) -> Result<NormalizedNoiseGrid> {
    let fbm = Fbm::new(
        perlin_seed(seed),
        settings.octaves,
        settings.persistence,
        settings.lacunarity,
        pixel_frequency(width, height, settings.scale),
    );
    debug!(seed, width, height, octaves = fbm.octaves, "generating single-layer noise");
    normalize_field(width, height, |x, y| fbm.sample(x, y))
}

/// Weighted sum of three fBm layers, each with its own seed and scale.
pub fn generate_layered(seed: u64, width: u32, height: u32, layered: &LayeredNoise) -> Result<NormalizedNoiseGrid> {
    let base = perlin_seed(seed);
    let layers: Vec<(Fbm, f64)> = layered
        .layers()
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let fbm = Fbm::new(
                base.wrapping_add(i as u32 + 1),
                LAYER_OCTAVES,
                LAYER_PERSISTENCE,
                LAYER_LACUNARITY,
                pixel_frequency(width, height, layer.scale),
            );
            (fbm, layer.weight)
        })
        .collect();
    debug!(seed, width, height, "generating layered noise");
    normalize_field(width, height, |x, y| {
        layers.iter().map(|(fbm, weight)| fbm.sample(x, y) * weight).sum()
    })
}

pub fn generate_for(seed: u64, width: u32, height: u32, params: &NoiseParameters) -> Result<NormalizedNoiseGrid> {
    match params {
        NoiseParameters::Single(settings) => generate(seed, width, height, settings),
        NoiseParameters::Layered(layered) => generate_layered(seed, width, height, layered),
    }
}

/// Evaluates `raw` at each pixel center, then rescales the whole grid to [0, 1].
fn normalize_field<F>(width: u32, height: u32, raw: F) -> Result<NormalizedNoiseGrid>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    let row_len = width as usize;
    let mut values = vec![0.0f64; row_len * height as usize];
    values.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let py = y as f64 + 0.5;
        for (x, out) in row.iter_mut().enumerate() {
            *out = raw(x as f64 + 0.5, py);
        }
    });

    if let Some(index) = values.par_iter().position_any(|v| !v.is_finite()) {
        return Err(GalaxyError::computation(format!(
            "noise produced a non-finite value at ({}, {})",
            index % row_len,
            index / row_len
        )));
    }

    let (min, max) = values
        .par_iter()
        .fold(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );

    let span = max - min;
    if span > 0.0 {
        values.par_iter_mut().for_each(|v| *v = ((*v - min) / span).clamp(0.0, 1.0));
    } else {
        values.par_iter_mut().for_each(|v| *v = FLAT_FIELD_VALUE);
    }

    NormalizedNoiseGrid::new(width, height, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> FractalSettings {
        FractalSettings { octaves: 4, persistence: 0.5, lacunarity: 2.0, scale: 0.5 }
    }

    #[test]
    fn single_layer_is_bit_identical_across_runs() {
        let a = generate(12345, 100, 100, &settings()).unwrap();
        let b = generate(12345, 100, 100, &settings()).unwrap();
        assert_eq!(a.get(50, 50).to_bits(), b.get(50, 50).to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn normalization_spans_unit_interval() {
        let grid = generate(7, 120, 100, &settings()).unwrap();
        let min = grid.values().iter().cloned().fold(f64::INFINITY, f64::min);
        let max = grid.values().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(1, 64, 64, &settings()).unwrap();
        let b = generate(2, 64, 64, &settings()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn layered_weights_need_not_sum_to_one() {
        let mut layered = LayeredNoise::default();
        layered.macro_layer.weight = 5.0;
        layered.micro_layer.weight = 3.0;
        let grid = generate_layered(99, 80, 60, &layered).unwrap();
        assert!(grid.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(grid, generate_layered(99, 80, 60, &layered).unwrap());
    }

    #[test]
    fn zero_weights_give_flat_field() {
        let zero = NoiseLayer { scale: 1.0, weight: 0.0 };
        let layered = LayeredNoise { macro_layer: zero, meso_layer: zero, micro_layer: zero };
        let grid = generate_layered(3, 32, 32, &layered).unwrap();
        assert!(grid.values().iter().all(|&v| v == FLAT_FIELD_VALUE));
    }

    #[test]
    fn octaves_are_clamped() {
        let mut many = settings();
        many.octaves = 50;
        let mut max = settings();
        max.octaves = MAX_OCTAVES;
        assert_eq!(generate(5, 40, 40, &many).unwrap(), generate(5, 40, 40, &max).unwrap());
    }

    #[test]
    fn center_value_is_pinned() {
        let grid = generate(12345, 100, 100, &settings()).unwrap();
        assert_eq!(grid.get(50, 50).to_bits(), 0x3fe2_62c9_3bbb_dbd7);
    }

    #[test]
    fn seed_fold_keeps_low_seeds_and_collides_on_high_halves() {
        assert_eq!(perlin_seed(12345), 12345);
        assert_eq!(perlin_seed(1), perlin_seed(1 << 32));
        assert_eq!(generate(1, 40, 40, &settings()).unwrap(), generate(1 << 32, 40, 40, &settings()).unwrap());
        assert_ne!(perlin_seed(1), perlin_seed(2 << 32));
    }

    #[test]
    fn non_finite_settings_fail_the_grid() {
        let mut broken = settings();
        broken.persistence = f64::INFINITY;
        broken.octaves = 3;
        let err = generate(5, 40, 40, &broken).unwrap_err();
        assert!(matches!(err, GalaxyError::ComputationFailure(_)));
    }
}
