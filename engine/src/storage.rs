//! Records of generated galaxies and an in-memory store for them.
//!
//! Durable storage lives outside this crate behind [`Repository`];
//! [`InMemoryRepository`] is the process-local implementation.

use std::hash::Hash;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::api::{GalaxyError, Result};
use crate::field::RenderedImage;
use crate::hashing::{CosmeticHash, StructuralHash};
use crate::params::{CosmeticParameters, GenerationParameters};

/// Something a [`Repository`] can store: it has an id once saved and is
/// addressed by the hash of its content.
pub trait Entity: Clone + Send + Sync {
    type Hash: Copy + Eq + Hash + Send + Sync;

    fn id(&self) -> Option<Uuid>;
    fn set_id(&mut self, id: Uuid);
    fn content_hash(&self) -> Self::Hash;
}

pub trait Repository<T: Entity>: Send + Sync {
    /// Stores `entity`, assigning an id when it has none. An unsaved entity
    /// whose hash is already stored takes over the stored id.
    fn save(&self, entity: T) -> Result<T>;
    fn find_by_hash(&self, hash: T::Hash) -> Option<T>;
    fn find_by_id(&self, id: Uuid) -> Option<T>;
    fn delete_by_id(&self, id: Uuid) -> Option<T>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStructure {
    pub id: Option<Uuid>,
    pub params: GenerationParameters,
    pub structural_hash: StructuralHash,
    /// Highest score of any render of this structure.
    pub best_score: Option<f64>,
}

impl BaseStructure {
    pub fn new(params: GenerationParameters) -> Result<Self> {
        let structural_hash = StructuralHash::of(&params)?;
        Ok(Self { id: None, params, structural_hash, best_score: None })
    }
}

impl Entity for BaseStructure {
    type Hash = StructuralHash;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn content_hash(&self) -> StructuralHash {
        self.structural_hash
    }
}

/// Small RGB8 preview kept with a render record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    #[serde(with = "serde_bytes")]
    pub rgb: Vec<u8>,
}

impl Thumbnail {
    pub fn from_image(image: &RenderedImage, max_side: u32) -> Self {
        let thumb = image.thumbnail(max_side);
        Self { width: thumb.width(), height: thumb.height(), rgb: thumb.as_raw().to_vec() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmeticRender {
    pub id: Option<Uuid>,
    pub base_id: Uuid,
    pub cosmetic: CosmeticParameters,
    pub cosmetic_hash: CosmeticHash,
    pub thumbnail: Thumbnail,
    pub score: Option<f64>,
}

impl CosmeticRender {
    pub fn new(base: &BaseStructure, cosmetic: CosmeticParameters, thumbnail: Thumbnail) -> Result<Self> {
        let base_id = base
            .id
            .ok_or_else(|| GalaxyError::invalid("base_id", "base structure must be saved before its renders"))?;
        let cosmetic_hash = CosmeticHash::of(base.structural_hash, &cosmetic)?;
        Ok(Self { id: None, base_id, cosmetic, cosmetic_hash, thumbnail, score: None })
    }
}

impl Entity for CosmeticRender {
    type Hash = CosmeticHash;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn content_hash(&self) -> CosmeticHash {
        self.cosmetic_hash
    }
}

/// `DashMap`-backed repository with a secondary index by content hash.
pub struct InMemoryRepository<T: Entity> {
    by_id: DashMap<Uuid, T>,
    by_hash: DashMap<T::Hash, Uuid>,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self { by_id: DashMap::new(), by_hash: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn save(&self, mut entity: T) -> Result<T> {
        let hash = entity.content_hash();
        let id = match entity.id() {
            Some(id) => id,
            None => *self.by_hash.entry(hash).or_insert_with(Uuid::new_v4),
        };
        entity.set_id(id);
        if let Some(previous) = self.by_id.insert(id, entity.clone()) {
            let old_hash = previous.content_hash();
            if old_hash != hash {
                self.by_hash.remove_if(&old_hash, |_, owner| *owner == id);
            }
        }
        self.by_hash.insert(hash, id);
        debug!(%id, "saved entity");
        Ok(entity)
    }

    fn find_by_hash(&self, hash: T::Hash) -> Option<T> {
        let id = *self.by_hash.get(&hash)?;
        self.find_by_id(id)
    }

    fn find_by_id(&self, id: Uuid) -> Option<T> {
        self.by_id.get(&id).map(|entity| entity.clone())
    }

    fn delete_by_id(&self, id: Uuid) -> Option<T> {
        let (_, entity) = self.by_id.remove(&id)?;
        self.by_hash.remove_if(&entity.content_hash(), |_, owner| *owner == id);
        Some(entity)
    }
}

impl InMemoryRepository<CosmeticRender> {
    pub fn find_by_base_id(&self, base_id: Uuid) -> Vec<CosmeticRender> {
        self.by_id
            .iter()
            .filter(|render| render.base_id == base_id)
            .map(|render| render.clone())
            .collect()
    }

    /// Sets the score of a render and raises its base's best score when the
    /// new score beats it. The base is updated in place under its shard lock.
    pub fn record_score(
        &self,
        render_id: Uuid,
        score: f64,
        bases: &InMemoryRepository<BaseStructure>,
    ) -> Result<CosmeticRender> {
        if !score.is_finite() {
            return Err(GalaxyError::invalid("score", format!("must be finite, got {score}")));
        }
        let render = {
            let mut render = self
                .by_id
                .get_mut(&render_id)
                .ok_or_else(|| GalaxyError::invalid("render_id", format!("no render {render_id}")))?;
            render.score = Some(score);
            render.clone()
        };
        let mut base = bases
            .by_id
            .get_mut(&render.base_id)
            .ok_or_else(|| GalaxyError::invalid("base_id", format!("no base structure {}", render.base_id)))?;
        if base.best_score.map_or(true, |best| score > best) {
            base.best_score = Some(score);
        }
        Ok(render)
    }
}
