//! Content addresses for the two cache tiers.
//!
//! Parameters are serialized with bincode and folded through FNV-1a, which
//! keeps hashes identical across processes (`DefaultHasher` is randomly
//! seeded per process).

use std::fmt;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};

use crate::api::{GalaxyError, Result};
use crate::params::{CosmeticParameters, GenerationParameters};

/// FNV-1a 64-bit hasher with fixed offset basis.
#[derive(Debug)]
pub struct FnvHasher(u64);

impl FnvHasher {
    pub const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }
}

fn encode<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| GalaxyError::computation(format!("cannot encode {what}: {e}")))
}

/// Key of the structural tier; a pure function of [`GenerationParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralHash(pub u64);

impl StructuralHash {
    pub fn of(params: &GenerationParameters) -> Result<Self> {
        let mut hasher = FnvHasher::new();
        hasher.write(&encode(params, "generation parameters")?);
        Ok(Self(hasher.finish()))
    }
}

impl fmt::Display for StructuralHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Key of the cosmetic tier, derived from the structure it colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CosmeticHash(pub u64);

impl CosmeticHash {
    pub fn of(structure: StructuralHash, cosmetic: &CosmeticParameters) -> Result<Self> {
        let mut hasher = FnvHasher::new();
        // `write_u64` would hash native-endian bytes.
        hasher.write(&structure.0.to_le_bytes());
        hasher.write(&encode(cosmetic, "cosmetic parameters")?);
        Ok(Self(hasher.finish()))
    }
}

impl fmt::Display for CosmeticHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;
    use crate::shapes::{RingParams, ShapeParameters};

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(FnvHasher::new().finish(), 0xcbf29ce484222325);
        let mut hasher = FnvHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn structural_hash_is_pure() {
        let params = GenerationParameters::default();
        assert_eq!(StructuralHash::of(&params).unwrap(), StructuralHash::of(&params.clone()).unwrap());
    }

    #[test]
    fn every_structural_field_matters() {
        let base = GenerationParameters::default();
        let hash = StructuralHash::of(&base).unwrap();
        let variants = [
            GenerationParameters { seed: base.seed + 1, ..base.clone() },
            GenerationParameters { width: base.width + 1, ..base.clone() },
            GenerationParameters { warp_strength: 0.0, ..base.clone() },
            GenerationParameters { shape: ShapeParameters::Ring(RingParams::default()), ..base.clone() },
        ];
        for changed in &variants {
            assert_ne!(StructuralHash::of(changed).unwrap(), hash, "{changed:?}");
        }
    }

    #[test]
    fn cosmetic_hash_depends_on_both_inputs() {
        let structure = StructuralHash::of(&GenerationParameters::default()).unwrap();
        let cosmetic = CosmeticParameters::default();
        let hash = CosmeticHash::of(structure, &cosmetic).unwrap();
        assert_eq!(hash, CosmeticHash::of(structure, &cosmetic).unwrap());
        assert_ne!(hash, CosmeticHash::of(StructuralHash(structure.0 ^ 1), &cosmetic).unwrap());
        let recolored = CosmeticParameters { colors: ColorScheme::named("ember"), ..cosmetic };
        assert_ne!(hash, CosmeticHash::of(structure, &recolored).unwrap());
    }

    // Pinned values: a change here means every stored hash is orphaned.
    #[test]
    fn default_hashes_are_pinned() {
        let structural = StructuralHash::of(&GenerationParameters::default()).unwrap();
        assert_eq!(structural, StructuralHash(0x8db5_7bdc_ed0f_c050));
        let cosmetic = CosmeticHash::of(structural, &CosmeticParameters::default()).unwrap();
        assert_eq!(cosmetic, CosmeticHash(0x2a66_239e_82bd_eae3));
    }

    #[test]
    fn hashes_print_as_fixed_width_hex() {
        assert_eq!(StructuralHash(0xab).to_string(), "00000000000000ab");
        assert_eq!(CosmeticHash(u64::MAX).to_string(), "ffffffffffffffff");
        assert_eq!(serde_json::to_string(&StructuralHash(7)).unwrap(), "7");
    }
}
