//! # Write Service
//!
//! `ResourceWriteService<T>` orchestrates the six write verbs for one resource
//! type on top of a [`WriteRepository`] and a [`ResourceReader`].
//!
//! Every verb runs the same fixed sequence:
//!
//! 1. **Validate** the input shape. Unknown relationship names, cardinality
//!    mismatches, references of the wrong type, disallowed client ids and
//!    resource-level hook failures are rejected with `Validation` before any
//!    storage call.
//! 2. **Fetch** state: the database snapshot for updates, and the existence of
//!    every referenced resource through the [`RelationshipResolver`]. The
//!    resolved references replace the requested ones, so the repository only
//!    ever sees canonical ids.
//! 3. **Mutate** through exactly one repository call.
//! 4. **Invalidate** the cached copy (updates flush explicitly; the storage
//!    adapter flushes on every committed mutation).
//!
//! Repository failures are returned unchanged.
//!
//! ## Cancellation
//!
//! Reads race against the token and give up as soon as it fires. Mutations are
//! never abandoned mid-flight: the token is checked right before the repository
//! call and handed down so the engine can check it before committing. Once a
//! mutation has been applied, the service no longer reports `Cancelled`.

use crate::config::WriteOptions;
use crate::framework::{
    Cardinality, IdFn, IdGenerator, RelationshipDef, RelationshipValue, Resource, ResourceReader,
    ResourceRef, Snapshot, WriteError, WriteRepository, WriteResult,
};
use crate::services::capabilities::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    SetRelationshipService, UpdateService,
};
use crate::services::resolver::RelationshipResolver;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Generic write service for resource type `T`.
pub struct ResourceWriteService<T: Resource> {
    repository: Arc<dyn WriteRepository<T>>,
    reader: Arc<dyn ResourceReader<T>>,
    resolver: Arc<RelationshipResolver>,
    ids: Box<dyn IdGenerator<T::Id>>,
    options: WriteOptions,
}

impl<T: Resource> ResourceWriteService<T> {
    /// `next_id` supplies the id of a created resource when the client sends none.
    pub fn new(
        repository: Arc<dyn WriteRepository<T>>,
        reader: Arc<dyn ResourceReader<T>>,
        resolver: Arc<RelationshipResolver>,
        next_id: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> Self {
        Self::with_id_generator(repository, reader, resolver, IdFn(next_id))
    }

    /// Like [`new`](Self::new), with a generator that also learns about
    /// client-supplied ids.
    pub fn with_id_generator(
        repository: Arc<dyn WriteRepository<T>>,
        reader: Arc<dyn ResourceReader<T>>,
        resolver: Arc<RelationshipResolver>,
        ids: impl IdGenerator<T::Id> + 'static,
    ) -> Self {
        Self {
            repository,
            reader,
            resolver,
            ids: Box::new(ids),
            options: WriteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// The declaration of `name`, which must be a to-many relationship.
    fn to_many(name: &str) -> WriteResult<&'static RelationshipDef> {
        let def = T::relationship_def(name)?;
        if def.cardinality != Cardinality::ToMany {
            return Err(WriteError::validation(format!(
                "{}.{} is {}; members can only be added to or removed from to-many relationships",
                T::TYPE_NAME,
                name,
                def.cardinality
            )));
        }
        Ok(def)
    }

    /// Shape checks for an add/remove value set.
    fn check_members(
        &self,
        def: &RelationshipDef,
        values: &BTreeSet<ResourceRef>,
    ) -> WriteResult<()> {
        if values.is_empty() && !self.options.allow_empty_relationship_changes {
            return Err(WriteError::validation(format!(
                "{}.{}: the value set must not be empty",
                T::TYPE_NAME,
                def.name
            )));
        }
        def.check_targets(values)
    }

    /// Shape checks for every relationship value in `values`.
    fn check_values(values: &[(&'static str, RelationshipValue)]) -> WriteResult<()> {
        for (name, value) in values {
            T::relationship_def(name)?.check_value(value)?;
        }
        Ok(())
    }

    /// Canonical forms of `values`, once every referenced resource is known to exist.
    async fn resolve_all(
        &self,
        values: Vec<(&'static str, RelationshipValue)>,
        cancel: &CancellationToken,
    ) -> WriteResult<Vec<(&'static str, RelationshipValue)>> {
        let mut resolved = Vec::with_capacity(values.len());
        for (name, value) in values {
            let value = until_cancelled(cancel, self.resolver.resolve(name, value)).await?;
            resolved.push((name, value));
        }
        Ok(resolved)
    }

    /// The database resource, or `NotFound`.
    async fn fetch(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<Snapshot<T>> {
        until_cancelled(cancel, self.reader.get(id))
            .await?
            .ok_or_else(|| WriteError::not_found(T::TYPE_NAME, id))
    }
}

/// Fails with `Cancelled` once `cancel` has fired.
fn checkpoint(cancel: &CancellationToken) -> WriteResult<()> {
    if cancel.is_cancelled() {
        return Err(WriteError::Cancelled);
    }
    Ok(())
}

/// Runs a side-effect-free step, abandoning it when `cancel` fires.
async fn until_cancelled<R>(
    cancel: &CancellationToken,
    step: impl Future<Output = WriteResult<R>>,
) -> WriteResult<R> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WriteError::Cancelled),
        result = step => result,
    }
}

#[async_trait]
impl<T: Resource> CreateService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, params, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn create(
        &self,
        id: Option<T::Id>,
        params: T::Create,
        cancel: &CancellationToken,
    ) -> WriteResult<T> {
        debug!(?params, "create called");

        let client_supplied = id.is_some();
        let id = match id {
            Some(id) if !self.options.allow_client_generated_ids => {
                return Err(WriteError::validation(format!(
                    "client-generated ids are not accepted for {} (got {})",
                    T::TYPE_NAME,
                    id
                )));
            }
            Some(id) => id,
            None => self.ids.next_id(),
        };

        let mut resource = T::from_create_params(id, params)?;
        resource.validate()?;
        let relationships = resource.relationship_values();
        Self::check_values(&relationships)?;

        for (name, value) in self.resolve_all(relationships, cancel).await? {
            resource.set_relationship(name, value)?;
        }

        checkpoint(cancel)?;
        self.repository.create(resource.clone(), cancel).await?;
        if client_supplied {
            self.ids.observe(resource.id());
        }
        Ok(resource)
    }
}

#[async_trait]
impl<T: Resource> UpdateService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, patch, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn update(
        &self,
        id: &T::Id,
        patch: T::Patch,
        cancel: &CancellationToken,
    ) -> WriteResult<T> {
        debug!(?patch, "update called");

        let mut patch = patch;
        T::validate_patch(&patch)?;
        let targeted = T::patch_relationships(&patch);
        Self::check_values(&targeted)?;

        let database = self.fetch(id, cancel).await?;
        for (name, value) in self.resolve_all(targeted, cancel).await? {
            T::set_patch_relationship(&mut patch, name, value)?;
        }
        let mut merged = database.resource.clone();
        merged.apply_patch(&patch)?;
        merged.validate()?;

        checkpoint(cancel)?;
        self.repository.update(&patch, &database, cancel).await?;
        self.repository.flush_from_cache(&database.resource);

        // Applied: read back without racing the token. A row deleted in the
        // meantime still counts as a landed update.
        let fresh = self.reader.get(id).await?;
        Ok(fresh.map_or(merged, |snapshot| snapshot.resource))
    }
}

#[async_trait]
impl<T: Resource> DeleteService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn delete(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<bool> {
        debug!("delete called");
        checkpoint(cancel)?;
        self.repository.delete(id, cancel).await
    }
}

#[async_trait]
impl<T: Resource> AddRelationshipService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, values, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn add_to_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        debug!(?values, "add_to_relationship called");

        let def = Self::to_many(relationship)?;
        self.check_members(def, &values)?;

        let values = until_cancelled(cancel, self.resolver.resolve_set(def.name, &values)).await?;

        checkpoint(cancel)?;
        self.repository
            .add_relationship(id, def.name, values, cancel)
            .await
    }
}

#[async_trait]
impl<T: Resource> SetRelationshipService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, value, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        value: RelationshipValue,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        debug!(?value, "set_relationship called");

        let def = T::relationship_def(relationship)?;
        def.check_value(&value)?;

        let value = until_cancelled(cancel, self.resolver.resolve(def.name, value)).await?;

        checkpoint(cancel)?;
        self.repository
            .set_relationship(id, def.name, value, cancel)
            .await
    }
}

#[async_trait]
impl<T: Resource> DeleteRelationshipService<T> for ResourceWriteService<T> {
    #[instrument(skip(self, values, cancel), fields(resource_type = T::TYPE_NAME))]
    async fn remove_from_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        debug!(?values, "remove_from_relationship called");

        let def = Self::to_many(relationship)?;
        self.check_members(def, &values)?;

        let values = until_cancelled(cancel, self.resolver.resolve_set(def.name, &values)).await?;

        checkpoint(cancel)?;
        self.repository
            .delete_relationship(id, def.name, values, cancel)
            .await
    }
}
