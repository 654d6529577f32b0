//! # Write Repository
//!
//! The storage-facing contract. Any engine (relational, document, in-memory)
//! that implements [`WriteRepository`] and the matching read contract
//! [`ResourceReader`] can back the write service.
//!
//! Each of the six mutations is a single atomic transition against the
//! engine: implementations wrap them in a transaction where the engine has
//! one, and check the cancellation token right before committing so that a
//! cancelled call never leaves a partial relationship mutation behind.

use crate::framework::error::WriteResult;
use crate::framework::identity::ResourceRef;
use crate::framework::relationship::RelationshipValue;
use crate::framework::resource::Resource;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

/// Optimistic-concurrency token assigned by a versioning storage engine.
pub type Version = u64;

/// The database resource: authoritative state fetched right before a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub resource: T,
    /// `None` when the engine does not version rows (last writer wins).
    pub version: Option<Version>,
}

impl<T> Snapshot<T> {
    pub fn new(resource: T, version: Option<Version>) -> Self {
        Self { resource, version }
    }

    pub fn unversioned(resource: T) -> Self {
        Self::new(resource, None)
    }
}

/// Read collaborator used by the write service.
#[async_trait]
pub trait ResourceReader<T: Resource>: Send + Sync {
    /// Fetch the current state of `id`.
    async fn get(&self, id: &T::Id) -> WriteResult<Option<Snapshot<T>>>;

    async fn exists(&self, id: &T::Id) -> WriteResult<bool> {
        Ok(self.get(id).await?.is_some())
    }
}

/// Groups write operations against the underlying data store.
#[async_trait]
pub trait WriteRepository<T: Resource>: Send + Sync {
    /// Persists a brand-new resource including its initial relationships.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` on duplicate id or unique-key clash
    /// - `StorageUnavailable` on backend failure
    async fn create(&self, resource: T, cancel: &CancellationToken) -> WriteResult<()>;

    /// Adds values to a to-many relationship. Values already present are ignored.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` does not exist
    async fn add_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;

    /// Applies the delta between the request patch and the database resource.
    ///
    /// When the engine versions rows and `database.version` is set, the stored
    /// version must still match it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource disappeared
    /// - `ConcurrencyConflict` on version mismatch
    /// - `ConstraintViolation` if the merged state breaks a unique key
    async fn update(
        &self,
        request: &T::Patch,
        database: &Snapshot<T>,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;

    /// Replaces the membership of a relationship completely.
    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: RelationshipValue,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;

    /// Deletes a resource.
    ///
    /// Returns `true` if the resource was deleted, `false` if it did not exist.
    async fn delete(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<bool>;

    /// Removes values from a to-many relationship. Absent values are ignored.
    async fn delete_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        removal_values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;

    /// Ensures the next read of `resource` is served by the underlying store.
    fn flush_from_cache(&self, resource: &T);
}
