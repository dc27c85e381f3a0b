//! Post-processing on a colorized image.
//!
//! Order is fixed: star field first, then bloom, so stars glow too.

pub mod bloom;
pub mod stars;

use image::RgbImage;

pub use bloom::BloomSettings;
pub use stars::StarFieldSettings;

use crate::params::CosmeticParameters;

pub fn apply(image: &mut RgbImage, cosmetic: &CosmeticParameters, seed: u64) {
    if cosmetic.stars.enabled {
        stars::apply(image, &cosmetic.stars, seed);
    }
    if cosmetic.bloom.enabled {
        bloom::apply(image, &cosmetic.bloom);
    }
}

/// Adds `amount` (in [0, 1] of full scale) of `tint` light to one pixel,
/// saturating at 255. Out-of-bounds coordinates are ignored.
pub(crate) fn add_light(image: &mut RgbImage, x: i64, y: i64, amount: f64, tint: [f64; 3]) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 || amount <= 0.0 {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, gain) in pixel.0.iter_mut().zip(tint) {
        let add = (amount * gain * 255.0).round().clamp(0.0, 255.0) as u8;
        *channel = channel.saturating_add(add);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn add_light_saturates_and_ignores_outside() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([200, 10, 0]));
        add_light(&mut image, 0, 0, 0.5, [1.0, 1.0, 1.0]);
        assert_eq!(image.get_pixel(0, 0).0, [255, 138, 128]);
        add_light(&mut image, -1, 0, 1.0, [1.0, 1.0, 1.0]);
        add_light(&mut image, 2, 1, 1.0, [1.0, 1.0, 1.0]);
        assert_eq!(image.get_pixel(1, 1).0, [200, 10, 0]);
    }

    #[test]
    fn disabled_post_processing_is_a_no_op() {
        let mut image = RgbImage::from_pixel(50, 50, Rgb([250, 250, 250]));
        let before = image.clone();
        apply(&mut image, &CosmeticParameters::default(), 1);
        assert_eq!(image, before);
    }
}
