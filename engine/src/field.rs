//! Immutable grids produced by the pipeline: noise, intensity and pixels.
//!
//! All three are row-major with `x` fastest. Once constructed they are never
//! mutated; the caches hand them out behind `Arc`.

use image::{imageops, RgbImage};

use crate::api::{GalaxyError, Result, Rgb};

fn check_values(kind: &str, width: u32, height: u32, values: &[f64]) -> Result<()> {
    let expected = width as usize * height as usize;
    if values.len() != expected {
        return Err(GalaxyError::computation(format!(
            "{kind} holds {} values, expected {width}x{height}",
            values.len()
        )));
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite() || !(0.0..=1.0).contains(v)) {
        return Err(GalaxyError::computation(format!(
            "{kind} value {} at index {index} is outside [0, 1]",
            values[index]
        )));
    }
    Ok(())
}

/// Noise values rescaled to [0, 1] over the full grid.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNoiseGrid {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl NormalizedNoiseGrid {
    pub fn new(width: u32, height: u32, values: Vec<f64>) -> Result<Self> {
        check_values("noise grid", width, height, &values)?;
        Ok(Self { width, height, values })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear sample at a fractional position, clamped to the grid edges.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = x - x0 as f64;
        let ty = y - y0 as f64;
        let top = self.get(x0, y0) + (self.get(x1, y0) - self.get(x0, y0)) * tx;
        let bottom = self.get(x0, y1) + (self.get(x1, y1) - self.get(x0, y1)) * tx;
        top + (bottom - top) * ty
    }
}

/// Per-pixel galaxy brightness in [0, 1], before any color is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityField {
    width: u32,
    height: u32,
    seed: u64,
    values: Vec<f64>,
}

impl IntensityField {
    pub fn new(width: u32, height: u32, seed: u64, values: Vec<f64>) -> Result<Self> {
        check_values("intensity field", width, height, &values)?;
        Ok(Self { width, height, seed, values })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Seed of the structure, reused by the star field.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[f64] {
        let start = y as usize * self.width as usize;
        &self.values[start..start + self.width as usize]
    }
}

/// Final RGB8 pixel buffer. Encoding to a file format happens elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pixels: RgbImage,
}

impl RenderedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let [r, g, b] = self.pixels.get_pixel(x, y).0;
        Rgb::new(r, g, b)
    }

    /// Interleaved RGB bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_rgb_image(self) -> RgbImage {
        self.pixels
    }

    /// Downscaled copy whose longer side is at most `max_side`.
    pub fn thumbnail(&self, max_side: u32) -> RenderedImage {
        let (width, height) = (self.width(), self.height());
        let longest = width.max(height);
        if max_side == 0 || longest <= max_side {
            return self.clone();
        }
        let scale = max_side as f64 / longest as f64;
        let thumb_w = ((width as f64 * scale).round() as u32).max(1);
        let thumb_h = ((height as f64 * scale).round() as u32).max(1);
        RenderedImage::new(imageops::thumbnail(&self.pixels, thumb_w, thumb_h))
    }
}
