//! Generic write-side contracts.
//!
//! This module provides the building blocks every storage adapter and every
//! resource type plugs into.
//!
//! # Main Components
//!
//! - [`Identifiable`], [`ResourceId`], [`ResourceRef`] - resource identity
//! - [`Resource`] - trait that resource types implement
//! - [`RelationshipValue`], [`RelationshipDef`] - relationship payloads and declarations
//! - [`WriteRepository`], [`ResourceReader`] - the storage boundary
//! - [`ResourceCache`], [`MemoryCache`], [`CachedReader`] - cache invalidation and read-through
//! - [`WriteError`] - the error taxonomy
//!
//! # Testing
//!
//! See the [`mock`] module for a scripted repository and a map-backed reader.

pub mod cache;
pub mod error;
pub mod identity;
pub mod mock;
pub mod relationship;
pub mod repository;
pub mod resource;

pub use cache::{CachedReader, MemoryCache, ResourceCache};
pub use error::{WriteError, WriteResult};
pub use identity::{DefaultId, IdFn, IdGenerator, Identifiable, ResourceId, ResourceRef, Sequence};
pub use relationship::{Cardinality, RelationshipDef, RelationshipValue};
pub use repository::{ResourceReader, Snapshot, Version, WriteRepository};
pub use resource::Resource;
