//! Intensity to color.
//!
//! A gradient has four stops laid out along intensity as
//! background (0) -> outer (1/3) -> arm (2/3) -> core (1). Named palettes are
//! a read-only table compiled into the binary; anything not found there falls
//! back to the explicit colors of the [`ColorScheme`].

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::Rgb;
use crate::field::IntensityField;
use crate::params::CosmeticParameters;

/// Explicit colors plus an optional palette name that overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub palette: Option<String>,
    pub background: Rgb,
    pub core: Rgb,
    pub arm: Rgb,
    pub outer: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            palette: None,
            background: Rgb::new(2, 2, 10),
            core: Rgb::new(255, 244, 214),
            arm: Rgb::new(120, 140, 255),
            outer: Rgb::new(40, 30, 90),
        }
    }
}

impl ColorScheme {
    pub fn custom(background: Rgb, core: Rgb, arm: Rgb, outer: Rgb) -> Self {
        Self { palette: None, background, core, arm, outer }
    }

    pub fn named(palette: impl Into<String>) -> Self {
        Self { palette: Some(palette.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub background: Rgb,
    pub core: Rgb,
    pub arm: Rgb,
    pub outer: Rgb,
}

pub const PALETTES: &[Palette] = &[
    Palette {
        name: "classic",
        background: Rgb::new(0, 0, 8),
        core: Rgb::new(255, 248, 230),
        arm: Rgb::new(150, 170, 255),
        outer: Rgb::new(30, 40, 110),
    },
    Palette {
        name: "nebula",
        background: Rgb::new(5, 2, 15),
        core: Rgb::new(255, 250, 240),
        arm: Rgb::new(180, 50, 160),
        outer: Rgb::new(40, 20, 100),
    },
    Palette {
        name: "ember",
        background: Rgb::new(8, 0, 0),
        core: Rgb::new(255, 240, 180),
        arm: Rgb::new(255, 120, 30),
        outer: Rgb::new(120, 20, 10),
    },
    Palette {
        name: "glacier",
        background: Rgb::new(0, 4, 12),
        core: Rgb::new(235, 255, 255),
        arm: Rgb::new(80, 200, 230),
        outer: Rgb::new(10, 60, 110),
    },
    Palette {
        name: "emerald",
        background: Rgb::new(0, 6, 4),
        core: Rgb::new(230, 255, 220),
        arm: Rgb::new(60, 200, 120),
        outer: Rgb::new(10, 70, 50),
    },
    Palette {
        name: "monochrome",
        background: Rgb::new(0, 0, 0),
        core: Rgb::new(255, 255, 255),
        arm: Rgb::new(170, 170, 170),
        outer: Rgb::new(70, 70, 70),
    },
];

impl Palette {
    /// Case-insensitive lookup in [`PALETTES`].
    pub fn by_name(name: &str) -> Option<&'static Palette> {
        PALETTES.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        PALETTES.iter().map(|p| p.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    /// background, outer, arm, core
    stops: [Rgb; 4],
}

impl Gradient {
    pub fn new(background: Rgb, outer: Rgb, arm: Rgb, core: Rgb) -> Self {
        Self { stops: [background, outer, arm, core] }
    }

    pub fn resolve(scheme: &ColorScheme) -> Self {
        let named = scheme.palette.as_deref().and_then(|name| {
            let found = Palette::by_name(name);
            if found.is_none() {
                debug!(palette = name, "unknown palette, using custom colors");
            }
            found
        });
        match named {
            Some(p) => Self::new(p.background, p.outer, p.arm, p.core),
            None => Self::new(scheme.background, scheme.outer, scheme.arm, scheme.core),
        }
    }

    pub fn stops(&self) -> [Rgb; 4] {
        self.stops
    }

    #[inline]
    pub fn color_at(&self, intensity: f64) -> Rgb {
        let t = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        let scaled = t * 3.0;
        let segment = (scaled.floor() as usize).min(2);
        self.stops[segment].lerp(self.stops[segment + 1], scaled - segment as f64)
    }
}

pub fn color_at(intensity: f64, cosmetic: &CosmeticParameters) -> Rgb {
    Gradient::resolve(&cosmetic.colors).color_at(intensity)
}

/// Maps every pixel of `field` through the scheme's gradient.
pub fn colorize(field: &IntensityField, scheme: &ColorScheme) -> RgbImage {
    let gradient = Gradient::resolve(scheme);
    let width = field.width();
    let mut image = RgbImage::new(width, field.height());
    let row_bytes = width as usize * 3;
    let buffer: &mut [u8] = &mut image;
    buffer.par_chunks_mut(row_bytes).enumerate().for_each(|(y, row)| {
        for (pixel, &value) in row.chunks_exact_mut(3).zip(field.row(y as u32)) {
            pixel.copy_from_slice(&gradient.color_at(value).to_array());
        }
    });
    image
}
