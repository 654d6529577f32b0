//! The six single-verb write capabilities.
//!
//! Each trait maps one JSON:API write verb to one method. Request handlers
//! that only need one verb depend on one trait; handlers that need all of them
//! depend on [`ResourceCommandService`](super::ResourceCommandService).
//!
//! | Verb | HTTP | Trait |
//! |------|------|-------|
//! | Create | `POST /articles` | [`CreateService`] |
//! | Update | `PATCH /articles/1` | [`UpdateService`] |
//! | Delete | `DELETE /articles/1` | [`DeleteService`] |
//! | AddRelationship | `POST /articles/1/relationships/tags` | [`AddRelationshipService`] |
//! | SetRelationship | `PATCH /articles/1/relationships/tags` | [`SetRelationshipService`] |
//! | DeleteRelationship | `DELETE /articles/1/relationships/tags` | [`DeleteRelationshipService`] |

use crate::framework::{RelationshipValue, Resource, ResourceRef, WriteResult};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait CreateService<T: Resource>: Send + Sync {
    /// Creates a resource. `id` is the client-generated id, if any.
    async fn create(
        &self,
        id: Option<T::Id>,
        params: T::Create,
        cancel: &CancellationToken,
    ) -> WriteResult<T>;
}

#[async_trait]
pub trait UpdateService<T: Resource>: Send + Sync {
    /// Applies `patch` to the resource `id` and returns its new state.
    async fn update(
        &self,
        id: &T::Id,
        patch: T::Patch,
        cancel: &CancellationToken,
    ) -> WriteResult<T>;
}

#[async_trait]
pub trait DeleteService<T: Resource>: Send + Sync {
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: &T::Id, cancel: &CancellationToken) -> WriteResult<bool>;
}

#[async_trait]
pub trait AddRelationshipService<T: Resource>: Send + Sync {
    async fn add_to_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;
}

#[async_trait]
pub trait SetRelationshipService<T: Resource>: Send + Sync {
    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        value: RelationshipValue,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;
}

#[async_trait]
pub trait DeleteRelationshipService<T: Resource>: Send + Sync {
    async fn remove_from_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        values: BTreeSet<ResourceRef>,
        cancel: &CancellationToken,
    ) -> WriteResult<()>;
}
