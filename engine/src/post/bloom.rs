use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::Result;
use crate::shapes::{require_count, require_range};

pub const MAX_RADIUS: u32 = 50;
pub const MAX_INTENSITY: f64 = 2.0;

/// Two box blurs in a row approximate a Gaussian.
const BLUR_PASSES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Box blur radius in pixels.
    pub radius: u32,
    pub intensity: f64,
    /// Relative luma in [0, 1] a pixel must exceed to glow.
    pub threshold: f64,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self { enabled: false, radius: 6, intensity: 0.6, threshold: 0.7 }
    }
}

impl BloomSettings {
    pub fn validate(&self) -> Result<()> {
        require_count("bloom.radius", self.radius, 1, MAX_RADIUS)?;
        require_range("bloom.intensity", self.intensity, 0.0, MAX_INTENSITY)?;
        require_range("bloom.threshold", self.threshold, 0.0, 1.0)
    }
}

/// Bright pass, blur, additive composite.
pub fn apply(image: &mut RgbImage, settings: &BloomSettings) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || settings.intensity <= 0.0 {
        return;
    }
    let mut glow = bright_pass(image, settings.threshold);
    for _ in 0..BLUR_PASSES {
        glow = box_blur(&glow, width as usize, height as usize, settings.radius as usize);
    }
    debug!(width, height, radius = settings.radius, "compositing bloom");

    let gain = settings.intensity;
    let pixels: &mut [u8] = image;
    pixels.par_iter_mut().zip(glow.par_iter()).for_each(|(out, &g)| {
        let add = (g as f64 * gain).round().min(255.0) as u8;
        *out = out.saturating_add(add);
    });
}

fn luma(pixel: &[u8]) -> f64 {
    (0.2126 * pixel[0] as f64 + 0.7152 * pixel[1] as f64 + 0.0722 * pixel[2] as f64) / 255.0
}

/// Copy of `image` with every pixel at or below `threshold` luma set to black.
fn bright_pass(image: &RgbImage, threshold: f64) -> Vec<u8> {
    let mut bright = image.as_raw().clone();
    bright.par_chunks_mut(3).for_each(|pixel| {
        if luma(pixel) <= threshold {
            pixel.fill(0);
        }
    });
    bright
}

/// Separable box blur with edge clamping. The vertical pass runs as a
/// horizontal pass over the transposed buffer.
fn box_blur(src: &[u8], width: usize, height: usize, radius: usize) -> Vec<u8> {
    if radius == 0 {
        return src.to_vec();
    }
    let horizontal = blur_rows(src, width, radius);
    let transposed = transpose(&horizontal, width, height);
    let vertical = blur_rows(&transposed, height, radius);
    transpose(&vertical, height, width)
}

/// Sliding-window blur along each row of an interleaved RGB buffer.
fn blur_rows(src: &[u8], width: usize, radius: usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    let row_bytes = width * 3;
    let r = radius as i64;
    let last = width as i64 - 1;
    let window = (2 * radius + 1) as u32;
    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .for_each(|(out, row)| {
            let at = |x: i64, c: usize| row[x.clamp(0, last) as usize * 3 + c] as u32;
            let mut sums = [0u32; 3];
            for i in -r..=r {
                for (c, sum) in sums.iter_mut().enumerate() {
                    *sum += at(i, c);
                }
            }
            for x in 0..width as i64 {
                if x > 0 {
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum = *sum + at(x + r, c) - at(x - 1 - r, c);
                    }
                }
                let base = x as usize * 3;
                for (c, sum) in sums.iter().enumerate() {
                    out[base + c] = (sum / window) as u8;
                }
            }
        });
    dst
}

fn transpose(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(height * 3).enumerate().for_each(|(x, column)| {
        for y in 0..height {
            let from = (y * width + x) * 3;
            column[y * 3..y * 3 + 3].copy_from_slice(&src[from..from + 3]);
        }
    });
    dst
}
