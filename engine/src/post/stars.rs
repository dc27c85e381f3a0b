use std::f64::consts::TAU;

use image::RgbImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::add_light;
use crate::api::{GalaxyError, Result};
use crate::shapes::{require_count, require_range};

pub const STAR_SEED_SALT: u64 = 0x5354_4152_4649_454c;

/// Spike length as a multiple of the star's size.
pub const SPIKE_LENGTH_FACTOR: f64 = 4.0;
/// Spike brightness at the star center, relative to the star.
pub const SPIKE_GAIN: f64 = 0.8;
pub const MIN_STAR_BRIGHTNESS: f64 = 0.55;

pub const MAX_DENSITY: f64 = 0.01;
pub const MAX_STAR_SIZE: f64 = 10.0;
pub const MAX_SPIKES: u32 = 8;

/// Blue-white, white and warm star tints, as channel gains.
const STAR_TINTS: [[f64; 3]; 3] = [[0.8, 0.88, 1.0], [1.0, 1.0, 1.0], [1.0, 0.9, 0.75]];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarFieldSettings {
    pub enabled: bool,
    /// Stars per pixel.
    pub density: f64,
    /// Largest star radius in pixels.
    pub max_star_size: f64,
    pub diffraction_spikes: bool,
    pub spike_count: u32,
}

impl Default for StarFieldSettings {
    fn default() -> Self {
        Self { enabled: false, density: 0.0005, max_star_size: 2.5, diffraction_spikes: false, spike_count: 4 }
    }
}

impl StarFieldSettings {
    pub fn validate(&self) -> Result<()> {
        require_range("stars.density", self.density, 0.0, MAX_DENSITY)?;
        require_range("stars.max_star_size", self.max_star_size, 1.0, MAX_STAR_SIZE)?;
        require_count("stars.spike_count", self.spike_count, 0, MAX_SPIKES)?;
        if self.diffraction_spikes && self.spike_count == 0 {
            return Err(GalaxyError::invalid("stars.spike_count", "diffraction spikes need at least one spike"));
        }
        Ok(())
    }

    pub fn star_count(&self, width: u32, height: u32) -> usize {
        (self.density * width as f64 * height as f64).round() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: u32,
    pub y: u32,
    pub size: f64,
    pub brightness: f64,
    pub tint: [f64; 3],
}

/// Seed-derived star positions; the same seed always gives the same sky.
pub fn scatter(settings: &StarFieldSettings, seed: u64, width: u32, height: u32) -> Vec<Star> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ STAR_SEED_SALT);
    (0..settings.star_count(width, height))
        .map(|_| Star {
            x: rng.gen_range(0..width),
            y: rng.gen_range(0..height),
            size: settings.max_star_size * (1.0 - rng.gen::<f64>()),
            brightness: rng.gen_range(MIN_STAR_BRIGHTNESS..1.0),
            tint: STAR_TINTS[rng.gen_range(0..STAR_TINTS.len())],
        })
        .collect()
}

pub fn apply(image: &mut RgbImage, settings: &StarFieldSettings, seed: u64) {
    let stars = scatter(settings, seed, image.width(), image.height());
    debug!(count = stars.len(), spikes = settings.diffraction_spikes, "drawing star field");
    for star in &stars {
        draw_star(image, star);
        if settings.diffraction_spikes {
            draw_spikes(image, star, settings.spike_count);
        }
    }
}

/// Soft disk with linear falloff; the center pixel always gets full brightness.
fn draw_star(image: &mut RgbImage, star: &Star) {
    let reach = star.size + 0.5;
    let extent = star.size.ceil() as i64;
    let (cx, cy) = (star.x as i64, star.y as i64);
    for oy in -extent..=extent {
        for ox in -extent..=extent {
            let d = ((ox * ox + oy * oy) as f64).sqrt();
            let falloff = 1.0 - d / reach;
            if falloff > 0.0 {
                add_light(image, cx + ox, cy + oy, star.brightness * falloff, star.tint);
            }
        }
    }
}

fn draw_spikes(image: &mut RgbImage, star: &Star, spike_count: u32) {
    if spike_count == 0 {
        return;
    }
    let length = star.size * SPIKE_LENGTH_FACTOR;
    let steps = length.ceil() as u32;
    for k in 0..spike_count {
        let (sin, cos) = (k as f64 * TAU / spike_count as f64).sin_cos();
        // Start just outside the disk so the core is not counted twice.
        for step in (star.size.ceil() as u32).max(1)..=steps {
            let t = step as f64;
            let fade = 1.0 - t / (length + 1.0);
            let x = (star.x as f64 + cos * t).round() as i64;
            let y = (star.y as f64 + sin * t).round() as i64;
            add_light(image, x, y, star.brightness * SPIKE_GAIN * fade, star.tint);
        }
    }
}
