//! # Command Service Facade
//!
//! A request handler for one resource type needs all six write verbs. Instead
//! of injecting six services it takes one [`ResourceCommandService`].
//!
//! - Any type implementing the six capabilities is a `ResourceCommandService`
//!   through the blanket impl (e.g. [`ResourceWriteService`](super::ResourceWriteService)).
//! - [`ResourceCommands`] composes six independently supplied capabilities,
//!   so a verb can be swapped (or mocked) without touching the others.
//!
//! The facade adds no logic of its own.

use crate::framework::{RelationshipValue, Resource, ResourceRef, WriteResult};
use crate::services::capabilities::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    SetRelationshipService, UpdateService,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The union of the six write capabilities for `T`.
pub trait ResourceCommandService<T: Resource>:
    CreateService<T>
    + UpdateService<T>
    + DeleteService<T>
    + AddRelationshipService<T>
    + SetRelationshipService<T>
    + DeleteRelationshipService<T>
{
}

impl<T, S> ResourceCommandService<T> for S
where
    T: Resource,
    S: CreateService<T>
        + UpdateService<T>
        + DeleteService<T>
        + AddRelationshipService<T>
        + SetRelationshipService<T>
        + DeleteRelationshipService<T>,
{
}

/// Composes one implementation per capability into a single command surface.
pub struct ResourceCommands<T: Resource> {
    creator: Arc<dyn CreateService<T>>,
    updater: Arc<dyn UpdateService<T>>,
    deleter: Arc<dyn DeleteService<T>>,
    adder: Arc<dyn AddRelationshipService<T>>,
    setter: Arc<dyn SetRelationshipService<T>>,
    remover: Arc<dyn DeleteRelationshipService<T>>,
}

impl<T: Resource> Clone for ResourceCommands<T> {
    fn clone(&self) -> Self {
        Self {
            creator: self.creator.clone(),
            updater: self.updater.clone(),
            deleter: self.deleter.clone(),
            adder: self.adder.clone(),
            setter: self.setter.clone(),
            remover: self.remover.clone(),
        }
    }
}

impl<T: Resource> ResourceCommands<T> {
    pub fn new(
        creator: Arc<dyn CreateService<T>>,
        updater: Arc<dyn UpdateService<T>>,
        deleter: Arc<dyn DeleteService<T>>,
        adder: Arc<dyn AddRelationshipService<T>>,
        setter: Arc<dyn SetRelationshipService<T>>,
        remover: Arc<dyn DeleteRelationshipService<T>>,
    ) -> Self {
        Self {
            creator,
            updater,
            deleter,
            adder,
            setter,
            remover,
        }
    }

    /// Uses one service for all six capabilities.
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: ResourceCommandService<T> + 'static,
    {
        Self::new(
            service.clone(),
            service.clone(),
            service.clone(),
            service.clone(),
            service.clone(),
            service,
        )
    }
}

#[async_trait]
impl<T: Resource> CreateService<T> for ResourceCommands<T> {
    async fn create(
        &self,
        id: Option<T::Id>,
        params: T::Create,
        cancel: &CancellationToken,
    ) -> WriteResult<T> {
        self.creator.create(id, params, cancel).await
    }
}

#[async_trait]
impl<T: Resource> UpdateService<T> for ResourceCommands<T> {
    async fn update(
        &self,
        id: &T::Id,
        patch: T::Patch,
        cancel: &CancellationToken,
    ) -> WriteResult<T> {
        self.updater.update(id, patch, cancel).await
    }
}

#[async_trait]
impl<T: Resource> DeleteService<T> for ResourceCommands<T> {
    async fn delete(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<bool> {
        self.deleter.delete(id, cancel).await
    }
}

#[async_trait]
impl<T: Resource> AddRelationshipService<T> for ResourceCommands<T> {
    async fn add_to_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.adder
            .add_to_relationship(id, relationship, values, cancel)
            .await
    }
}

#[async_trait]
impl<T: Resource> SetRelationshipService<T> for ResourceCommands<T> {
    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        value: RelationshipValue,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.setter
            .set_relationship(id, relationship, value, cancel)
            .await
    }
}

#[async_trait]
impl<T: Resource> DeleteRelationshipService<T> for ResourceCommands<T> {
    async fn remove_from_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.remover
            .remove_from_relationship(id, relationship, values, cancel)
            .await
    }
}
