//! # System Lifecycle & Orchestration
//!
//! Individual stores and services are simple; wiring them together is where
//! the complexity lives. [`BlogSystem`] is the conductor for the example
//! domain:
//!
//! 1. **Store creation**: one [`StoreActor`](crate::store::StoreActor) per
//!    resource type, each with its own [`MemoryCache`](crate::framework::MemoryCache)
//! 2. **Dependency injection**: every store is registered with the
//!    [`RelationshipResolver`](crate::services::RelationshipResolver) that all
//!    services share
//! 3. **Graceful shutdown**: dropping the clients closes the channels, then
//!    every actor task is awaited
//!
//! Observability is set up separately through [`tracing::setup_tracing`].

pub mod blog_system;
pub mod tracing;

pub use blog_system::{BlogSystem, ResourceEndpoint};
