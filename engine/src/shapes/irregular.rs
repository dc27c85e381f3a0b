use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{blend_noise, require_count, require_positive, require_range};
use crate::api::{Point, Result};

pub const NOISE_BASE: f64 = 0.5;
pub const NOISE_RANGE: f64 = 0.5;

pub const CORE_WEIGHT: f64 = 0.3;
pub const CLUMP_WEIGHT: f64 = 0.7;

/// Exponential decay of the weak core over normalized radius.
pub const CORE_FALLOFF: f64 = 4.0;

pub const CLUMP_SEED_SALT: u64 = 0x434c_554d_5053_0000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrregularParams {
    pub radius: f64,
    pub clump_count: u32,
    /// Gaussian sigma of one clump, in pixels.
    pub clump_size: f64,
    /// 0 places clumps on a regular ring; 1 scatters them freely.
    pub irregularity: f64,
}

impl Default for IrregularParams {
    fn default() -> Self {
        Self { radius: 350.0, clump_count: 7, clump_size: 45.0, irregularity: 0.6 }
    }
}

impl IrregularParams {
    pub fn validate(&self) -> Result<()> {
        require_positive("irregular.radius", self.radius)?;
        require_count("irregular.clump_count", self.clump_count, 1, 12)?;
        require_positive("irregular.clump_size", self.clump_size)?;
        require_range("irregular.irregularity", self.irregularity, 0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clump {
    pub dx: f64,
    pub dy: f64,
    pub size: f64,
    pub brightness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrregularLayout {
    clumps: Vec<Clump>,
}

impl IrregularLayout {
    pub fn generate(p: &IrregularParams, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ CLUMP_SEED_SALT);
        let jitter = p.irregularity;
        let clumps = (0..p.clump_count)
            .map(|i| {
                let slot = i as f64 * TAU / p.clump_count as f64;
                let angle = slot + jitter * rng.gen_range(-PI..PI);
                let distance = p.radius * (0.25 + 0.5 * rng.gen::<f64>()) * (1.0 + jitter * rng.gen_range(-0.5..0.5));
                Clump {
                    dx: distance * angle.cos(),
                    dy: distance * angle.sin(),
                    size: p.clump_size * (1.0 + jitter * rng.gen_range(-0.5..0.5)),
                    brightness: rng.gen_range(0.6..1.0),
                }
            })
            .collect();
        Self { clumps }
    }

    pub fn clumps(&self) -> &[Clump] {
        &self.clumps
    }
}

pub fn intensity(p: &IrregularParams, layout: &IrregularLayout, px: f64, py: f64, center: Point, noise: f64) -> f64 {
    let core = (-center.distance(px, py) / p.radius * CORE_FALLOFF).exp();
    let clumps: f64 = layout
        .clumps
        .iter()
        .map(|c| {
            let dx = px - center.x - c.dx;
            let dy = py - center.y - c.dy;
            c.brightness * (-(dx * dx + dy * dy) / (2.0 * c.size * c.size)).exp()
        })
        .sum();
    let structure = CORE_WEIGHT * core + CLUMP_WEIGHT * clumps.min(1.0);
    (structure * blend_noise(noise, NOISE_BASE, NOISE_RANGE)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_irregularity_spaces_clumps_evenly() {
        let p = IrregularParams { irregularity: 0.0, clump_count: 4, ..IrregularParams::default() };
        let layout = IrregularLayout::generate(&p, 1);
        for (i, c) in layout.clumps().iter().enumerate() {
            let expected = i as f64 * TAU / 4.0;
            let angle = c.dy.atan2(c.dx).rem_euclid(TAU);
            assert!((angle - expected).abs() < 1e-9, "clump {i} at {angle}");
            assert_eq!(c.size, p.clump_size);
        }
    }

    #[test]
    fn clump_outshines_empty_space() {
        let p = IrregularParams::default();
        let layout = IrregularLayout::generate(&p, 21);
        let center = Point::new(400.0, 400.0);
        let c = layout.clumps()[0];
        let on = intensity(&p, &layout, 400.0 + c.dx, 400.0 + c.dy, center, 0.5);
        let far = intensity(&p, &layout, 400.0 + 3.0 * p.radius, 400.0, center, 0.5);
        assert!(on > far);
    }

    #[test]
    fn core_alone_is_weak() {
        let p = IrregularParams { radius: 100.0, clump_size: 1.0, ..IrregularParams::default() };
        let layout = IrregularLayout { clumps: Vec::new() };
        let center = Point::new(0.0, 0.0);
        assert!((intensity(&p, &layout, 0.0, 0.0, center, 1.0) - CORE_WEIGHT).abs() < 1e-12);
    }
}
