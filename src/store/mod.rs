//! In-memory storage adapter.
//!
//! A [`StoreActor`] owns the rows of one resource type; its [`StoreClient`]
//! implements [`WriteRepository`](crate::framework::WriteRepository) and
//! [`ResourceReader`](crate::framework::ResourceReader). Rows are versioned
//! when [`StoreConfig::optimistic_concurrency`](crate::config::StoreConfig) is
//! on, and unique keys declared by the resource type are enforced on every
//! mutation that can change them.

pub mod actor;
pub mod client;
pub mod message;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use message::{Response, StoreRequest};

use crate::config::StoreConfig;
use crate::framework::Resource;

/// Starts a store for `T` on the current runtime and returns its client.
pub fn spawn<T: Resource>(config: &StoreConfig) -> (StoreClient<T>, tokio::task::JoinHandle<()>) {
    let (actor, client) = StoreActor::<T>::new(config);
    let handle = tokio::spawn(actor.run());
    (client, handle)
}
