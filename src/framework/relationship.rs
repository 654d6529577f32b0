//! # Relationships
//!
//! A relationship is either to-one (a single, nullable reference) or to-many
//! (a set of references). Values only ever carry identity, never attributes.
//!
//! Resource types declare their relationships statically through
//! [`RelationshipDef`]; callers resolve the cardinality from the declaration and
//! build the matching [`RelationshipValue`] variant instead of inspecting the
//! payload at runtime.

use crate::framework::error::{WriteError, WriteResult};
use crate::framework::identity::ResourceRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => write!(f, "to-one"),
            Cardinality::ToMany => write!(f, "to-many"),
        }
    }
}

/// Static declaration of one relationship on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipDef {
    /// Public relationship name, e.g. `"tags"`.
    pub name: &'static str,
    /// Type name of the related resources, e.g. `"tags"`.
    pub target: &'static str,
    pub cardinality: Cardinality,
}

impl RelationshipDef {
    pub const fn to_one(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::ToOne,
        }
    }

    pub const fn to_many(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::ToMany,
        }
    }

    /// Looks up `name` in `defs`, failing with a validation error when unknown.
    pub fn find(
        defs: &'static [RelationshipDef],
        resource_type: &str,
        name: &str,
    ) -> WriteResult<&'static RelationshipDef> {
        defs.iter().find(|def| def.name == name).ok_or_else(|| {
            WriteError::validation(format!(
                "{} has no relationship named '{}'",
                resource_type, name
            ))
        })
    }

    /// Checks that every reference points at this relationship's target type.
    pub fn check_targets<'a>(
        &self,
        references: impl IntoIterator<Item = &'a ResourceRef>,
    ) -> WriteResult<()> {
        for reference in references {
            if !reference.is_type(self.target) {
                return Err(WriteError::validation(format!(
                    "relationship '{}' expects {} but got {}",
                    self.name, self.target, reference
                )));
            }
        }
        Ok(())
    }

    /// Checks both cardinality and target types of `value`.
    pub fn check_value(&self, value: &RelationshipValue) -> WriteResult<()> {
        if value.cardinality() != self.cardinality {
            return Err(WriteError::validation(format!(
                "relationship '{}' is {} but a {} value was supplied",
                self.name,
                self.cardinality,
                value.cardinality()
            )));
        }
        self.check_targets(value.references())
    }
}

/// The membership of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipValue {
    /// `None` clears the relationship (`"data": null`).
    ToOne(Option<ResourceRef>),
    ToMany(BTreeSet<ResourceRef>),
}

impl RelationshipValue {
    pub fn to_one(reference: ResourceRef) -> Self {
        Self::ToOne(Some(reference))
    }

    pub fn to_many(references: impl IntoIterator<Item = ResourceRef>) -> Self {
        Self::ToMany(references.into_iter().collect())
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::ToOne(_) => Cardinality::ToOne,
            Self::ToMany(_) => Cardinality::ToMany,
        }
    }

    pub fn references(&self) -> Vec<&ResourceRef> {
        match self {
            Self::ToOne(reference) => reference.iter().collect(),
            Self::ToMany(set) => set.iter().collect(),
        }
    }

    /// Unions `values` into a to-many membership. Returns whether anything was added.
    pub fn add_members(&mut self, values: &BTreeSet<ResourceRef>) -> WriteResult<bool> {
        match self {
            Self::ToMany(set) => {
                let before = set.len();
                set.extend(values.iter().cloned());
                Ok(set.len() != before)
            }
            Self::ToOne(_) => Err(WriteError::validation(
                "cannot add members to a to-one relationship",
            )),
        }
    }

    /// Removes `values` from a to-many membership. Returns whether anything was removed.
    pub fn remove_members(&mut self, values: &BTreeSet<ResourceRef>) -> WriteResult<bool> {
        match self {
            Self::ToMany(set) => {
                let before = set.len();
                set.retain(|member| !values.contains(member));
                Ok(set.len() != before)
            }
            Self::ToOne(_) => Err(WriteError::validation(
                "cannot remove members from a to-one relationship",
            )),
        }
    }
}
