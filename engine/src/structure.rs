//! The structural stage: noise, warp and shape folded into an intensity field.

use rayon::prelude::*;
use tracing::debug;

use crate::api::{GalaxyError, Result};
use crate::field::IntensityField;
use crate::params::GenerationParameters;
use crate::sampling;
use crate::shapes::ShapeKernel;
use crate::warp;

/// Computes the intensity field for `params`, which must already be valid.
///
/// Each pixel is warped first; both the shape and the noise lookup then use
/// the warped position.
pub fn compute_intensity_field(params: &GenerationParameters) -> Result<IntensityField> {
    let (width, height) = (params.width, params.height);
    let noise = sampling::generate_for(params.seed, width, height, &params.noise)?;
    let warp_field = if params.warp_strength > 0.0 {
        Some(warp::warp_field(params.seed, width, height)?)
    } else {
        None
    };
    let kernel = ShapeKernel::prepare(&params.shape, params.seed);
    let center = params.center();
    debug!(width, height, kind = ?params.kind(), warp = params.warp_strength, "evaluating intensity field");

    let mut values = vec![0.0; width as usize * height as usize];
    values.par_chunks_mut(width as usize).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let (px, py) = (x as f64, y as f64);
            let (wx, wy) = match &warp_field {
                Some(field) => warp::warp(px, py, params.warp_strength, field),
                None => (px, py),
            };
            *out = kernel.intensity(wx, wy, center, noise.sample(wx, wy));
        }
    });

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        let (x, y) = (index % width as usize, index / width as usize);
        return Err(GalaxyError::computation(format!("intensity at ({x}, {y}) is not finite")));
    }
    values.par_iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0));
    IntensityField::new(width, height, params.seed, values)
}
