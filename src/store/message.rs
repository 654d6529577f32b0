//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](super::StoreClient) to its
//! [`StoreActor`](super::StoreActor). Every mutation carries the caller's
//! cancellation token so the actor can drop it right before committing.

use crate::framework::{
    RelationshipValue, Resource, ResourceRef, Snapshot, WriteResult,
};
use std::collections::BTreeSet;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Type alias for the one-shot response channel used by the store.
pub type Response<T> = oneshot::Sender<WriteResult<T>>;

/// One read or one atomic mutation against the store.
#[derive(Debug)]
pub enum StoreRequest<T: Resource> {
    Get {
        id: T::Id,
        respond_to: Response<Option<Snapshot<T>>>,
    },
    Create {
        resource: T,
        cancel: CancellationToken,
        respond_to: Response<()>,
    },
    Update {
        patch: T::Patch,
        database: Snapshot<T>,
        cancel: CancellationToken,
        respond_to: Response<()>,
    },
    AddRelationship {
        id: T::Id,
        relationship: String,
        values: BTreeSet<ResourceRef>,
        cancel: CancellationToken,
        respond_to: Response<()>,
    },
    SetRelationship {
        id: T::Id,
        relationship: String,
        value: RelationshipValue,
        cancel: CancellationToken,
        respond_to: Response<()>,
    },
    DeleteRelationship {
        id: T::Id,
        relationship: String,
        values: BTreeSet<ResourceRef>,
        cancel: CancellationToken,
        respond_to: Response<()>,
    },
    Delete {
        id: T::Id,
        cancel: CancellationToken,
        respond_to: Response<bool>,
    },
}
