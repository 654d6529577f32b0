//! # Resource Cache
//!
//! The cache is process-wide shared state with an explicit lifecycle:
//!
//! - **populate**: lazily, by [`CachedReader`] on a read miss
//! - **invalidate**: by the write path through
//!   [`WriteRepository::flush_from_cache`](crate::framework::WriteRepository::flush_from_cache)
//!   and on every committed mutation of the storage adapter
//!
//! The write path never populates the cache.

use crate::framework::error::WriteResult;
use crate::framework::repository::{ResourceReader, Snapshot};
use crate::framework::resource::Resource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Cached materializations of one resource type.
///
/// Invalidation is best-effort and must never fail.
pub trait ResourceCache<T: Resource>: Send + Sync {
    fn get(&self, id: &T::Id) -> Option<Snapshot<T>>;
    fn put(&self, snapshot: Snapshot<T>);
    fn invalidate(&self, id: &T::Id);
}

/// In-memory [`ResourceCache`], shared between readers and writers via `Arc`.
pub struct MemoryCache<T: Resource> {
    entries: RwLock<HashMap<T::Id, Snapshot<T>>>,
}

impl<T: Resource> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Resource> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> ResourceCache<T> for MemoryCache<T> {
    fn get(&self, id: &T::Id) -> Option<Snapshot<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, snapshot: Snapshot<T>) {
        let id = snapshot.resource.id().clone();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, snapshot);
    }

    fn invalidate(&self, id: &T::Id) {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        trace!(resource_type = T::TYPE_NAME, %id, removed, "Cache invalidated");
    }
}

/// Read-through reader: serves hits from the cache and populates it on a miss.
pub struct CachedReader<T: Resource> {
    inner: Arc<dyn ResourceReader<T>>,
    cache: Arc<dyn ResourceCache<T>>,
}

impl<T: Resource> CachedReader<T> {
    pub fn new(inner: Arc<dyn ResourceReader<T>>, cache: Arc<dyn ResourceCache<T>>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<T: Resource> ResourceReader<T> for CachedReader<T> {
    async fn get(&self, id: &T::Id) -> WriteResult<Option<Snapshot<T>>> {
        if let Some(hit) = self.cache.get(id) {
            trace!(resource_type = T::TYPE_NAME, %id, "Cache hit");
            return Ok(Some(hit));
        }
        let fetched = self.inner.get(id).await?;
        if let Some(snapshot) = &fetched {
            self.cache.put(snapshot.clone());
        }
        Ok(fetched)
    }
}
