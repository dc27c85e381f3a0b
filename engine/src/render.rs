//! The cosmetic stage: color, then stars, then bloom.

use tracing::debug;

use crate::api::Result;
use crate::color;
use crate::field::{IntensityField, RenderedImage};
use crate::params::CosmeticParameters;
use crate::post;

pub fn render_image(field: &IntensityField, cosmetic: &CosmeticParameters) -> Result<RenderedImage> {
    debug!(
        width = field.width(),
        height = field.height(),
        palette = cosmetic.colors.palette.as_deref().unwrap_or("custom"),
        "rendering image"
    );
    let mut image = color::colorize(field, &cosmetic.colors);
    post::apply(&mut image, cosmetic, field.seed());
    Ok(RenderedImage::new(image))
}
