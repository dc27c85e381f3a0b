use crate::api::Result;
use crate::field::NormalizedNoiseGrid;
use crate::sampling::{self, FractalSettings};

/// Displacement of a full-strength warp, as a fraction of the shorter grid side.
pub const WARP_EXTENT: f64 = 0.1;

/// Mixed into the generation seed so the warp field is decorrelated from shape noise.
pub const WARP_SEED_SALT: u64 = 0x5741_5250_5741_5250;

pub const WARP_NOISE: FractalSettings = FractalSettings {
    octaves: 3,
    persistence: 0.5,
    lacunarity: 2.0,
    scale: 0.3,
};

/// Secondary noise field that drives [`warp`].
pub fn warp_field(seed: u64, width: u32, height: u32) -> Result<NormalizedNoiseGrid> {
    sampling::generate(seed ^ WARP_SEED_SALT, width, height, &WARP_NOISE)
}

/// Moves a sample coordinate before the shape is evaluated.
///
/// The x offset reads the field at the point itself; the y offset reads it at
/// the point mirrored through the grid center, so the two axes move
/// independently. A strength of zero is the identity.
pub fn warp(x: f64, y: f64, strength: f64, field: &NormalizedNoiseGrid) -> (f64, f64) {
    if strength == 0.0 {
        return (x, y);
    }
    let span = strength * WARP_EXTENT * field.width().min(field.height()) as f64;
    let mirrored_x = field.width() as f64 - 1.0 - x;
    let mirrored_y = field.height() as f64 - 1.0 - y;
    let dx = (field.sample(x, y) * 2.0 - 1.0) * span;
    let dy = (field.sample(mirrored_x, mirrored_y) * 2.0 - 1.0) * span;
    (x + dx, y + dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_strength_is_identity() {
        let field = warp_field(11, 100, 100).unwrap();
        assert_eq!(warp(12.25, 80.5, 0.0, &field), (12.25, 80.5));
    }

    #[test]
    fn displacement_is_bounded_by_strength() {
        let field = warp_field(11, 200, 100).unwrap();
        let limit = 0.5 * WARP_EXTENT * 100.0;
        let mut moved = false;
        for (x, y) in [(0.0, 0.0), (33.0, 71.0), (150.0, 20.0), (199.0, 99.0)] {
            let (wx, wy) = warp(x, y, 0.5, &field);
            assert!((wx - x).abs() <= limit + 1e-9);
            assert!((wy - y).abs() <= limit + 1e-9);
            moved |= wx != x || wy != y;
        }
        assert!(moved);
    }
}
