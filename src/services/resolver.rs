//! # Relationship Resolver
//!
//! Relationship values only carry `{type, id}` pairs in their wire form. Before a
//! write links to them, the service asks the resolver whether each referenced
//! resource exists. The resolver is a registry of per-type existence checks,
//! each backed by that type's read collaborator.
//!
//! Resolution also canonicalizes: every reference that passes comes back with
//! its id re-rendered from the typed identifier, so `tags/05` and `tags/5` are
//! the same member by the time the repository compares them.

use crate::framework::{
    RelationshipValue, Resource, ResourceId, ResourceReader, ResourceRef, WriteError, WriteResult,
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Existence lookup for one resource type, keyed by the wire form of the id.
#[async_trait]
pub trait ExistenceCheck: Send + Sync {
    /// The canonical wire form of `raw_id`, or `Validation` if it doesn't parse.
    fn canonical(&self, raw_id: &str) -> WriteResult<String>;

    async fn exists(&self, raw_id: &str) -> WriteResult<bool>;
}

/// [`ExistenceCheck`] over the typed reader of `T`.
pub struct TypedExistence<T: Resource> {
    reader: Arc<dyn ResourceReader<T>>,
}

impl<T: Resource> TypedExistence<T> {
    pub fn new(reader: Arc<dyn ResourceReader<T>>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<T: Resource> ExistenceCheck for TypedExistence<T> {
    fn canonical(&self, raw_id: &str) -> WriteResult<String> {
        <T::Id as ResourceId>::canonical(raw_id)
    }

    async fn exists(&self, raw_id: &str) -> WriteResult<bool> {
        let id = <T::Id as ResourceId>::parse(raw_id)?;
        self.reader.exists(&id).await
    }
}

/// Registry of existence checks keyed by resource type name.
#[derive(Clone, Default)]
pub struct RelationshipResolver {
    checks: HashMap<&'static str, Arc<dyn ExistenceCheck>>,
}

impl RelationshipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reader of `T` under `T::TYPE_NAME`.
    pub fn register<T: Resource>(&mut self, reader: Arc<dyn ResourceReader<T>>) -> &mut Self {
        self.checks
            .insert(T::TYPE_NAME, Arc::new(TypedExistence::new(reader)));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T: Resource>(mut self, reader: Arc<dyn ResourceReader<T>>) -> Self {
        self.register(reader);
        self
    }

    pub fn knows(&self, resource_type: &str) -> bool {
        self.checks.contains_key(resource_type)
    }

    /// Resolves every reference of `value`, keeping its cardinality.
    pub async fn resolve(
        &self,
        relationship: &str,
        value: RelationshipValue,
    ) -> WriteResult<RelationshipValue> {
        match value {
            RelationshipValue::ToOne(None) => Ok(RelationshipValue::ToOne(None)),
            RelationshipValue::ToOne(Some(reference)) => {
                let resolved = self.resolve_one(relationship, &reference).await?;
                Ok(RelationshipValue::to_one(resolved))
            }
            RelationshipValue::ToMany(references) => {
                let resolved = self.resolve_set(relationship, &references).await?;
                Ok(RelationshipValue::ToMany(resolved))
            }
        }
    }

    /// Resolves a member set. Spellings of the same id collapse into one member.
    pub async fn resolve_set(
        &self,
        relationship: &str,
        references: &BTreeSet<ResourceRef>,
    ) -> WriteResult<BTreeSet<ResourceRef>> {
        let mut resolved = BTreeSet::new();
        for reference in references {
            resolved.insert(self.resolve_one(relationship, reference).await?);
        }
        Ok(resolved)
    }

    /// The canonical form of `reference` if it exists.
    ///
    /// Fails with `Validation` for unregistered types and malformed ids, and
    /// with `RelationshipNotFound` when the resource does not exist.
    async fn resolve_one(
        &self,
        relationship: &str,
        reference: &ResourceRef,
    ) -> WriteResult<ResourceRef> {
        let check = self.checks.get(reference.resource_type.as_str()).ok_or_else(|| {
            WriteError::validation(format!(
                "no resolver registered for resource type '{}'",
                reference.resource_type
            ))
        })?;
        let id = check.canonical(&reference.id)?;
        if !check.exists(&id).await? {
            return Err(WriteError::relationship_not_found(
                relationship,
                &reference.resource_type,
                &id,
            ));
        }
        trace!(relationship, %reference, "Related resource exists");
        Ok(ResourceRef::new(reference.resource_type.clone(), id))
    }
}
