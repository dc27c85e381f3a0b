//! Two content-addressed stores with single-flight computation.
//!
//! A slot is either `Pending` (one leader is computing, others wait on the
//! flight) or `Ready`. Failures are never stored: the leader removes its slot
//! and hands the error to whoever was waiting, so the next caller retries.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{GalaxyError, Result};
use crate::field::{IntensityField, RenderedImage};
use crate::hashing::{CosmeticHash, StructuralHash};
use crate::params::{CosmeticParameters, GenerationParameters};
use crate::render;
use crate::structure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from a ready slot.
    pub hits: u64,
    /// Lookups that led or joined a computation.
    pub misses: u64,
    pub computations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

/// Completion signal shared by the leader and its waiters.
pub(crate) struct Flight<V> {
    outcome: Mutex<Option<Result<Arc<V>>>>,
    done: Condvar,
}

impl<V> Flight<V> {
    fn new() -> Self {
        Self { outcome: Mutex::new(None), done: Condvar::new() }
    }

    fn publish(&self, outcome: Result<Arc<V>>) {
        *self.outcome.lock() = Some(outcome);
        self.done.notify_all();
    }

    pub(crate) fn wait(&self) -> Result<Arc<V>> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }
}

enum Slot<V> {
    Pending(Arc<Flight<V>>),
    Ready(Arc<V>),
}

pub(crate) enum Lookup<'a, K: Eq + Hash + Clone + fmt::Display, V> {
    Hit(Arc<V>),
    Wait(Arc<Flight<V>>),
    Lead(FlightGuard<'a, K, V>),
}

/// Held by the leader while it computes. Dropping it without `finish`
/// (a panic in the computation) fails the flight and frees the slot.
pub(crate) struct FlightGuard<'a, K: Eq + Hash + Clone + fmt::Display, V> {
    cache: &'a SingleFlightCache<K, V>,
    key: K,
    flight: Arc<Flight<V>>,
    finished: bool,
}

impl<K: Eq + Hash + Clone + fmt::Display, V> FlightGuard<'_, K, V> {
    fn finish(mut self, outcome: Result<Arc<V>>) -> Result<Arc<V>> {
        self.finished = true;
        match &outcome {
            Ok(value) => {
                if let Some(mut slot) = self.cache.slots.get_mut(&self.key) {
                    if matches!(&*slot, Slot::Pending(f) if Arc::ptr_eq(f, &self.flight)) {
                        *slot = Slot::Ready(Arc::clone(value));
                    }
                }
            }
            Err(err) => {
                warn!(cache = self.cache.name, key = %self.key, error = %err, "computation failed");
                self.release();
            }
        }
        self.flight.publish(outcome.clone());
        outcome
    }

    fn release(&self) {
        let flight = &self.flight;
        self.cache.slots.remove_if(&self.key, |_, slot| matches!(slot, Slot::Pending(f) if Arc::ptr_eq(f, flight)));
    }
}

impl<K: Eq + Hash + Clone + fmt::Display, V> Drop for FlightGuard<'_, K, V> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(cache = self.cache.name, key = %self.key, "computation panicked");
            self.release();
            self.flight.publish(Err(GalaxyError::computation(format!("computation for {} panicked", self.key))));
        }
    }
}

/// Concurrent map from key to a value computed at most once at a time.
pub struct SingleFlightCache<K, V> {
    name: &'static str,
    slots: DashMap<K, Slot<V>>,
    counters: Counters,
}

impl<K: Eq + Hash + Clone + fmt::Display, V> SingleFlightCache<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self { name, slots: DashMap::new(), counters: Counters::default() }
    }

    pub(crate) fn lookup(&self, key: K) -> Lookup<'_, K, V> {
        // The entry holds a shard lock; it is released before anyone waits.
        let lookup = match self.slots.entry(key.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => Lookup::Hit(Arc::clone(value)),
                Slot::Pending(flight) => Lookup::Wait(Arc::clone(flight)),
            },
            Entry::Vacant(entry) => {
                let flight = Arc::new(Flight::new());
                entry.insert(Slot::Pending(Arc::clone(&flight)));
                Lookup::Lead(FlightGuard { cache: self, key, flight, finished: false })
            }
        };
        let counter = match lookup {
            Lookup::Hit(_) => &self.counters.hits,
            _ => &self.counters.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        lookup
    }

    /// Returns the stored value for `key`, or runs `compute` if no one has.
    /// Callers arriving while `compute` runs block until it finishes and
    /// share its outcome, error included.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        match self.lookup(key) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Wait(flight) => flight.wait(),
            Lookup::Lead(guard) => {
                debug!(cache = self.name, key = %guard.key, "cache miss, computing");
                self.counters.computations.fetch_add(1, Ordering::Relaxed);
                let outcome = compute().map(Arc::new);
                guard.finish(outcome)
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        match self.slots.get(key).as_deref() {
            Some(Slot::Ready(value)) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Drops a ready value. In-flight computations are left alone.
    pub fn invalidate(&self, key: &K) -> bool {
        self.slots.remove_if(key, |_, slot| matches!(slot, Slot::Ready(_))).is_some()
    }

    pub fn clear(&self) {
        self.slots.retain(|_, slot| matches!(slot, Slot::Pending(_)));
    }

    /// Number of ready values.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot.value(), Slot::Ready(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            computations: self.counters.computations.load(Ordering::Relaxed),
        }
    }
}

/// The structural tier and the cosmetic tier, side by side.
pub struct GalaxyCache {
    structures: SingleFlightCache<StructuralHash, IntensityField>,
    images: SingleFlightCache<CosmeticHash, RenderedImage>,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for GalaxyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GalaxyCache {
    pub fn new() -> Self {
        Self {
            structures: SingleFlightCache::new("structure"),
            images: SingleFlightCache::new("image"),
            pool: None,
        }
    }

    /// Computations run inside `pool` instead of the global rayon pool.
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        Self { pool: Some(pool), ..Self::new() }
    }

    fn run<T: Send>(&self, job: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        }
    }

    pub fn get_or_compute_structure(
        &self,
        hash: StructuralHash,
        params: &GenerationParameters,
    ) -> Result<Arc<IntensityField>> {
        let field = self
            .structures
            .get_or_compute(hash, || self.run(|| structure::compute_intensity_field(params)))?;
        if (field.width(), field.height()) != (params.width, params.height) {
            return Err(GalaxyError::CacheInconsistency {
                key: hash.to_string(),
                reason: format!(
                    "cached field is {}x{}, request is {}x{}",
                    field.width(),
                    field.height(),
                    params.width,
                    params.height
                ),
            });
        }
        Ok(field)
    }

    pub fn get_or_compute_image(
        &self,
        hash: CosmeticHash,
        field: &IntensityField,
        cosmetic: &CosmeticParameters,
    ) -> Result<Arc<RenderedImage>> {
        let image = self
            .images
            .get_or_compute(hash, || self.run(|| render::render_image(field, cosmetic)))?;
        if (image.width(), image.height()) != (field.width(), field.height()) {
            return Err(GalaxyError::CacheInconsistency {
                key: hash.to_string(),
                reason: format!(
                    "cached image is {}x{}, field is {}x{}",
                    image.width(),
                    image.height(),
                    field.width(),
                    field.height()
                ),
            });
        }
        Ok(image)
    }

    pub fn structures(&self) -> &SingleFlightCache<StructuralHash, IntensityField> {
        &self.structures
    }

    pub fn images(&self) -> &SingleFlightCache<CosmeticHash, RenderedImage> {
        &self.images
    }

    pub fn clear(&self) {
        self.structures.clear();
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn concurrent_callers_share_one_computation() {
        let cache = SingleFlightCache::<u64, u64>::new("test");
        let runs = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_or_compute(1, || {
                            runs.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok(42)
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| **r.as_ref().unwrap() == 42));
        let stats = cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.hits + stats.misses, 8);
    }

    #[test]
    fn second_lookup_is_a_hit() {
        let cache = SingleFlightCache::<u64, &str>::new("test");
        cache.get_or_compute(3, || Ok("a")).unwrap();
        let again = cache.get_or_compute(3, || Ok("b")).unwrap();
        assert_eq!(*again, "a");
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, computations: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_released_and_retried() {
        let cache = SingleFlightCache::<u64, u32>::new("test");
        let err = cache.get_or_compute(5, || Err(GalaxyError::computation("boom"))).unwrap_err();
        assert_eq!(err, GalaxyError::ComputationFailure("boom".into()));
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_compute(5, || Ok(8)).unwrap(), 8);
        assert_eq!(cache.stats().computations, 2);
    }

    #[test]
    fn panicking_leader_frees_the_slot() {
        let cache = SingleFlightCache::<u64, u32>::new("test");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| cache.get_or_compute(9, || panic!("leader died"))));
        assert!(outcome.is_err());
        assert!(cache.get(&9).is_none());
        assert_eq!(*cache.get_or_compute(9, || Ok(1)).unwrap(), 1);
    }

    #[test]
    fn waiters_see_a_dropped_flight_as_failure() {
        let cache = SingleFlightCache::<u64, u32>::new("test");
        let Lookup::Lead(guard) = cache.lookup(7) else { panic!("expected to lead") };
        let Lookup::Wait(flight) = cache.lookup(7) else { panic!("expected to wait") };
        let waiter = thread::spawn(move || flight.wait());
        drop(guard);
        assert!(matches!(waiter.join().unwrap(), Err(GalaxyError::ComputationFailure(_))));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_and_clear_drop_ready_values() {
        let cache = SingleFlightCache::<u64, u32>::new("test");
        for key in 0..4 {
            cache.get_or_compute(key, || Ok(key as u32)).unwrap();
        }
        assert!(cache.invalidate(&2));
        assert!(!cache.invalidate(&2));
        assert_eq!(cache.len(), 3);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn structure_hit_with_other_dimensions_is_inconsistent() {
        let cache = GalaxyCache::new();
        let params = GenerationParameters { width: 100, height: 100, ..GenerationParameters::default() };
        let hash = StructuralHash::of(&params).unwrap();
        cache.get_or_compute_structure(hash, &params).unwrap();
        let bigger = GenerationParameters { width: 120, ..params };
        let err = cache.get_or_compute_structure(hash, &bigger).unwrap_err();
        assert!(matches!(err, GalaxyError::CacheInconsistency { .. }));
    }
}
