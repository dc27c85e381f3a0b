//! Deterministic galaxy image synthesis.
//!
//! Generation runs in two tiers. The structural tier turns
//! [`GenerationParameters`] into an [`IntensityField`] (noise, domain warp,
//! shape). The cosmetic tier turns a field plus [`CosmeticParameters`] into a
//! [`RenderedImage`] (color, stars, bloom). Each tier is a content-addressed
//! cache, so a structure is computed once no matter how often it is recolored.

pub mod api;
pub mod cache;
pub mod color;
pub mod config;
pub mod engine;
pub mod field;
pub mod hashing;
pub mod params;
pub mod post;
pub mod render;
pub mod sampling;
pub mod shapes;
pub mod storage;
pub mod structure;
pub mod warp;

pub use api::*;
pub use cache::{CacheStats, GalaxyCache, SingleFlightCache};
pub use color::{ColorScheme, Gradient, Palette};
pub use config::EngineConfig;
pub use engine::{EngineStats, GalaxyEngine};
pub use field::{IntensityField, NormalizedNoiseGrid, RenderedImage};
pub use hashing::{CosmeticHash, StructuralHash};
pub use params::{CosmeticParameters, GenerationParameters};
pub use post::{BloomSettings, StarFieldSettings};
pub use sampling::{FractalSettings, LayeredNoise, NoiseLayer, NoiseParameters};
pub use shapes::{EllipticalParams, IrregularParams, RingParams, ShapeKind, ShapeParameters, SpiralParams, VoronoiParams};
pub use storage::{BaseStructure, CosmeticRender, Entity, InMemoryRepository, Repository, Thumbnail};
