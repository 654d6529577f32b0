#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # JSON:API Write Pipeline
//!
//! > **The mutation side of a JSON:API server, generic over resource types.**
//!
//! This crate takes a partial resource from an inbound request, reconciles it
//! with the persisted state and performs create, update and delete operations,
//! including to-one and to-many relationship mutations. Storage engines plug in
//! behind one contract and receive an explicit cache-invalidation signal.
//!
//! HTTP routing, body deserialization, authorization and query/read building
//! stay outside; handlers call into a per-type command facade.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Capabilities, composed
//! JSON:API has six write verbs: create, update, delete, and for relationships
//! add (POST), set (PATCH) and delete (DELETE). Each verb is one small trait.
//! A handler that needs all of them depends on the union
//! [`ResourceCommandService`](services::ResourceCommandService).
//!
//! ### Generics: The Power of `T`
//! You'll see `ResourceWriteService<T: Resource>` and `StoreActor<T: Resource>`.
//! The orchestration and the storage loop are written once and work for
//! articles, tags, people and link records alike. The identifier is an
//! associated type bounded by [`ResourceId`](framework::ResourceId): integer by
//! default, `String` or `Uuid` where a type is keyed by an external system.
//!
//! ### Relationship values are a tagged union
//! [`RelationshipValue`](framework::RelationshipValue) is either `ToOne` or
//! `ToMany`. The declared [`RelationshipDef`](framework::RelationshipDef)
//! decides which one a request must carry.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Strict Ordering
//! Every verb runs validate → fetch → mutate → invalidate. Validation failures
//! never reach storage.
//!
//! ### 2. Optimistic Concurrency
//! The database snapshot handed to `update` carries the store-assigned version.
//! A versioning store rejects a stale snapshot with `ConcurrencyConflict`; a
//! non-versioning store lets the last writer win.
//!
//! ### 3. Cancellation
//! Every operation takes a `CancellationToken`. A cancelled call either lands
//! completely or not at all.
//!
//! ### 4. Observability
//! We use `tracing` everywhere with structured fields. See
//! [`lifecycle::tracing`] for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Contracts ([`framework`])
//! - **Role**: identity, relationships, the [`Resource`](framework::Resource)
//!   trait, the [`WriteRepository`](framework::WriteRepository) storage boundary,
//!   caching and the error taxonomy.
//! - **Testing**: [`framework::mock`] has a scripted repository and a fake reader.
//!
//! ### 2. The Pipeline ([`services`])
//! - **Role**: [`ResourceWriteService`](services::ResourceWriteService)
//!   orchestrates the verbs; [`ResourceCommands`](services::ResourceCommands) is
//!   the facade handed to handlers.
//!
//! ### 3. The Storage Adapter ([`store`])
//! - **Role**: an actor-backed, versioned in-memory engine implementing the
//!   repository contract.
//!
//! ### 4. The Example Domain ([`model`]) and its Wiring ([`lifecycle`])
//! - **Role**: articles, tags, people and article-tag link records, started
//!   together by [`BlogSystem`](lifecycle::BlogSystem).
//!
//! ### 5. Settings ([`config`])
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod services;
pub mod store;
