//! # Store Client
//!
//! The type-safe handle used to talk to a [`StoreActor`](super::StoreActor).
//! It implements both the [`WriteRepository`] and the [`ResourceReader`]
//! contracts, so the write service can treat the in-memory store like any
//! other storage engine.

use crate::framework::{
    RelationshipValue, Resource, ResourceCache, ResourceReader, ResourceRef, Snapshot,
    WriteError, WriteRepository, WriteResult,
};
use crate::store::message::{Response, StoreRequest};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Cloneable handle to a store actor.
///
/// When a cache is attached, every committed mutation invalidates the cached
/// copy of the affected resource.
pub struct StoreClient<T: Resource> {
    sender: mpsc::Sender<StoreRequest<T>>,
    cache: Option<Arc<dyn ResourceCache<T>>>,
}

impl<T: Resource> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T: Resource> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self {
            sender,
            cache: None,
        }
    }

    /// Attaches the cache this client invalidates on writes.
    pub fn with_cache(mut self, cache: Arc<dyn ResourceCache<T>>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn request<R: Send>(
        &self,
        build: impl FnOnce(Response<R>) -> StoreRequest<T>,
    ) -> WriteResult<R> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| WriteError::StorageUnavailable(format!("{} store closed", T::TYPE_NAME)))?;
        response.await.map_err(|_| {
            WriteError::StorageUnavailable(format!("{} store dropped response channel", T::TYPE_NAME))
        })?
    }

    fn invalidate(&self, id: &T::Id) {
        if let Some(cache) = &self.cache {
            trace!(resource_type = T::TYPE_NAME, %id, "Flushing after write");
            cache.invalidate(id);
        }
    }

    /// Invalidates the cached copy of `id` once `result` is known to be a success.
    fn settle<R>(&self, id: &T::Id, result: WriteResult<R>) -> WriteResult<R> {
        if result.is_ok() {
            self.invalidate(id);
        }
        result
    }
}

#[async_trait]
impl<T: Resource> ResourceReader<T> for StoreClient<T> {
    async fn get(&self, id: &T::Id) -> WriteResult<Option<Snapshot<T>>> {
        let id = id.clone();
        self.request(|respond_to| StoreRequest::Get { id, respond_to })
            .await
    }
}

#[async_trait]
impl<T: Resource> WriteRepository<T> for StoreClient<T> {
    async fn create(&self, resource: T, cancel: &CancellationToken) -> WriteResult<()> {
        let id = resource.id().clone();
        let cancel = cancel.clone();
        let result = self
            .request(|respond_to| StoreRequest::Create {
                resource,
                cancel,
                respond_to,
            })
            .await;
        self.settle(&id, result)
    }

    async fn add_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        let result = self
            .request(|respond_to| StoreRequest::AddRelationship {
                id: id.clone(),
                relationship: relationship.to_string(),
                values: new_values,
                cancel: cancel.clone(),
                respond_to,
            })
            .await;
        self.settle(id, result)
    }

    async fn update(
        &self,
        request: &T::Patch,
        database: &Snapshot<T>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        let result = self
            .request(|respond_to| StoreRequest::Update {
                patch: request.clone(),
                database: database.clone(),
                cancel: cancel.clone(),
                respond_to,
            })
            .await;
        self.settle(database.resource.id(), result)
    }

    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: RelationshipValue,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        let result = self
            .request(|respond_to| StoreRequest::SetRelationship {
                id: id.clone(),
                relationship: relationship.to_string(),
                value: new_values,
                cancel: cancel.clone(),
                respond_to,
            })
            .await;
        self.settle(id, result)
    }

    async fn delete(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<bool> {
        let result = self
            .request(|respond_to| StoreRequest::Delete {
                id: id.clone(),
                cancel: cancel.clone(),
                respond_to,
            })
            .await;
        self.settle(id, result)
    }

    async fn delete_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        removal_values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()> {
        let result = self
            .request(|respond_to| StoreRequest::DeleteRelationship {
                id: id.clone(),
                relationship: relationship.to_string(),
                values: removal_values,
                cancel: cancel.clone(),
                respond_to,
            })
            .await;
        self.settle(id, result)
    }

    fn flush_from_cache(&self, resource: &T) {
        self.invalidate(resource.id());
    }
}
