// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded LRU of serializer factories.
//!
//! One factory exists per `(whitelist, registry)` pair: the two together
//! decide which types may be serialized and how names resolve, so any other
//! sharing would leak types across trust domains. Long-running processes
//! that mint registries (one per loaded application module, say) would grow
//! an unbounded map; the least recently used factory is evicted instead.

use super::SerializerFactory;
use crate::error::Result;
use crate::model::RegistryId;
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryKey {
    pub whitelist: String,
    pub registry: RegistryId,
}

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub last_build_ns: u64,
}

pub struct FactoryCache {
    inner: RwLock<LruCache<FactoryKey, Arc<SerializerFactory>>>,
    stats: RwLock<LookupStats>,
}

impl FactoryCache {
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(LookupStats::default()),
        }
    }

    /// Cached factory for `key`, building and inserting one on a miss.
    ///
    /// A failed build leaves the cache untouched.
    pub fn get_or_try_build<F>(&self, key: FactoryKey, build: F) -> Result<Arc<SerializerFactory>>
    where
        F: FnOnce() -> Result<SerializerFactory>,
    {
        // `get` reorders the LRU list, so even hits take the write lock.
        let mut cache = self.inner.write();
        if let Some(hit) = cache.get(&key) {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(hit));
        }

        let start = Instant::now();
        let built = Arc::new(build()?);
        let evicted = cache.push(key.clone(), Arc::clone(&built));

        let mut stats = self.stats.write();
        stats.misses += 1;
        stats.last_build_ns = start.elapsed().as_nanos() as u64;
        if let Some((old, _)) = evicted.filter(|(old, _)| *old != key) {
            stats.evictions += 1;
            log::debug!(
                "[FACTORY-CACHE] evicted factory for {} / {}",
                old.whitelist,
                old.registry
            );
        }
        log::trace!(
            "[FACTORY-CACHE] [OK] built factory for {} / {}",
            key.whitelist,
            key.registry
        );
        Ok(built)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.read().cap().get()
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl std::fmt::Debug for FactoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
