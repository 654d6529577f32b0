//! # Resource Trait
//!
//! The `Resource` trait is the contract every JSON:API resource type (Article,
//! Tag, Person, ...) implements so the generic write service and storage
//! adapters can handle it.
//!
//! We use associated types to keep the request shapes type-safe: an `Article`
//! is created from an `ArticleCreate` payload and patched with an
//! `ArticlePatch`, and the compiler rejects a `TagPatch` sent to the article
//! service.
//!
//! # Request Resource vs Database Resource
//! `Patch` is the *request resource*: every field is optional and only the
//! fields the client wants to change are set. [`Resource::apply_patch`] merges
//! it into the *database resource* and must leave every untouched field as it
//! was.
//!
//! # Provided Methods (Hooks)
//! - [`Resource::validate`] / [`Resource::validate_patch`]: input checks run
//!   before any storage call.
//! - [`Resource::unique_keys`]: values the storage engine must keep unique.
//! - [`Resource::patch_relationships`] / [`Resource::set_patch_relationship`]:
//!   relationships targeted by a patch.
//!
//! The defaults accept everything.

use crate::framework::error::{WriteError, WriteResult};
use crate::framework::identity::Identifiable;
use crate::framework::relationship::{RelationshipDef, RelationshipValue};
use std::fmt::Debug;

pub trait Resource: Identifiable + Clone + PartialEq + Debug + Send + Sync + 'static {
    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The partial representation of a resource sent by an update request.
    type Patch: Clone + Send + Sync + Debug;

    /// Declared relationships of this type.
    fn relationships() -> &'static [RelationshipDef];

    /// Construct the full resource from its id and the create payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> WriteResult<Self>;

    /// Merge a patch into this resource. Fields absent from the patch stay untouched.
    fn apply_patch(&mut self, patch: &Self::Patch) -> WriteResult<()>;

    /// Current value of the relationship `name`, or `None` if undeclared.
    fn relationship(&self, name: &str) -> Option<RelationshipValue>;

    /// Replace the value of the relationship `name`.
    fn set_relationship(&mut self, name: &str, value: RelationshipValue) -> WriteResult<()>;

    // --- Hooks ---

    /// Called on a freshly constructed resource before it is persisted.
    fn validate(&self) -> WriteResult<()> {
        Ok(())
    }

    /// Called on an update request before the database resource is fetched.
    fn validate_patch(_patch: &Self::Patch) -> WriteResult<()> {
        Ok(())
    }

    /// Relationships a patch replaces, with their requested values.
    fn patch_relationships(_patch: &Self::Patch) -> Vec<(&'static str, RelationshipValue)> {
        Vec::new()
    }

    /// Replace the requested value of relationship `name` inside `patch`.
    ///
    /// Must accept every name [`Resource::patch_relationships`] reports.
    fn set_patch_relationship(
        _patch: &mut Self::Patch,
        name: &str,
        _value: RelationshipValue,
    ) -> WriteResult<()> {
        Err(WriteError::validation(format!(
            "{} patches carry no relationship named '{}'",
            Self::TYPE_NAME,
            name
        )))
    }

    /// `(key name, value)` pairs that must be unique across the resource type.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    // --- Provided ---

    /// Declaration of the relationship `name`.
    fn relationship_def(name: &str) -> WriteResult<&'static RelationshipDef> {
        RelationshipDef::find(Self::relationships(), Self::TYPE_NAME, name)
    }

    /// Every declared relationship with its current value.
    fn relationship_values(&self) -> Vec<(&'static str, RelationshipValue)> {
        Self::relationships()
            .iter()
            .filter_map(|def| self.relationship(def.name).map(|value| (def.name, value)))
            .collect()
    }
}
