//! The write pipeline consumed by request handlers.
//!
//! - [`capabilities`]: one trait per write verb
//! - [`ResourceWriteService`]: validate, fetch, mutate and invalidate for one resource type
//! - [`RelationshipResolver`]: existence checks for referenced resources
//! - [`ResourceCommandService`], [`ResourceCommands`]: the per-type facade

pub mod capabilities;
pub mod command;
pub mod resolver;
pub mod write_service;

pub use capabilities::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    SetRelationshipService, UpdateService,
};
pub use command::{ResourceCommandService, ResourceCommands};
pub use resolver::{ExistenceCheck, RelationshipResolver, TypedExistence};
pub use write_service::ResourceWriteService;
