//! The [`GalaxyEngine`] facade: hashes parameters, consults both cache tiers
//! and hands back shared results.

use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{GalaxyError, GalaxyRenderer, RenderOutput, Result};
use crate::cache::{CacheStats, GalaxyCache};
use crate::config::EngineConfig;
use crate::field::{IntensityField, RenderedImage};
use crate::hashing::{CosmeticHash, StructuralHash};
use crate::params::{CosmeticParameters, GenerationParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub structures: CacheStats,
    pub images: CacheStats,
}

pub struct GalaxyEngine {
    config: EngineConfig,
    cache: GalaxyCache,
}

impl GalaxyEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let thread_name = config.thread_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(move |index| format!("{thread_name}-{index}"))
            .build()
            .map_err(|e| GalaxyError::computation(format!("cannot build worker pool: {e}")))?;
        info!(
            "Creating galaxy engine with {} worker threads named {}",
            pool.current_num_threads(),
            config.thread_name
        );
        Ok(Self { config, cache: GalaxyCache::with_pool(Arc::new(pool)) })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn structural_hash(&self, params: &GenerationParameters) -> Result<StructuralHash> {
        StructuralHash::of(params)
    }

    pub fn cosmetic_hash(&self, structure: StructuralHash, cosmetic: &CosmeticParameters) -> Result<CosmeticHash> {
        CosmeticHash::of(structure, cosmetic)
    }

    /// Structural tier: the intensity field for `params`, computed at most once.
    pub fn compute_structure(&self, params: &GenerationParameters) -> Result<(StructuralHash, Arc<IntensityField>)> {
        params.validate()?;
        self.structure_for(params)
    }

    /// Cosmetic tier: colors and post-processing over an existing field.
    pub fn render_image(
        &self,
        structure: StructuralHash,
        field: &IntensityField,
        cosmetic: &CosmeticParameters,
    ) -> Result<(CosmeticHash, Arc<RenderedImage>)> {
        cosmetic.validate()?;
        self.image_for(structure, field, cosmetic)
    }

    /// One structure, several colorings. The field is computed or fetched once.
    pub fn render_variants(
        &self,
        params: &GenerationParameters,
        variants: &[CosmeticParameters],
    ) -> Result<Vec<RenderOutput>> {
        params.validate()?;
        for cosmetic in variants {
            cosmetic.validate()?;
        }
        let (structural_hash, field) = self.structure_for(params)?;
        debug!(structure = %structural_hash, variants = variants.len(), "rendering variants");
        variants
            .iter()
            .map(|cosmetic| {
                let (cosmetic_hash, image) = self.image_for(structural_hash, &field, cosmetic)?;
                Ok(RenderOutput { structural_hash, cosmetic_hash, field: Arc::clone(&field), image })
            })
            .collect()
    }

    // Callers validate first.
    fn structure_for(&self, params: &GenerationParameters) -> Result<(StructuralHash, Arc<IntensityField>)> {
        let hash = self.structural_hash(params)?;
        let field = self.cache.get_or_compute_structure(hash, params)?;
        Ok((hash, field))
    }

    fn image_for(
        &self,
        structure: StructuralHash,
        field: &IntensityField,
        cosmetic: &CosmeticParameters,
    ) -> Result<(CosmeticHash, Arc<RenderedImage>)> {
        let hash = self.cosmetic_hash(structure, cosmetic)?;
        let image = self.cache.get_or_compute_image(hash, field, cosmetic)?;
        Ok((hash, image))
    }

    /// Downscaled copy of `image` at the configured thumbnail size.
    pub fn thumbnail(&self, image: &RenderedImage) -> RenderedImage {
        image.thumbnail(self.config.thumbnail_size)
    }

    pub fn cache_stats(&self) -> EngineStats {
        EngineStats { structures: self.cache.structures().stats(), images: self.cache.images().stats() }
    }

    pub fn cache(&self) -> &GalaxyCache {
        &self.cache
    }

    pub fn clear_caches(&self) {
        info!("Clearing galaxy caches");
        self.cache.clear();
    }
}

impl GalaxyRenderer for GalaxyEngine {
    fn validate(&self, params: &GenerationParameters, cosmetic: &CosmeticParameters) -> Result<()> {
        params.validate()?;
        cosmetic.validate()
    }

    fn render(&self, params: &GenerationParameters, cosmetic: &CosmeticParameters) -> Result<RenderOutput> {
        self.validate(params, cosmetic)?;
        let (structural_hash, field) = self.structure_for(params)?;
        let (cosmetic_hash, image) = self.image_for(structural_hash, &field, cosmetic)?;
        Ok(RenderOutput { structural_hash, cosmetic_hash, field, image })
    }
}
