//! # Resource Identity Model
//!
//! Every resource type is identified by a type name plus an identifier of a
//! declared type. Identifiers are compared for equality and used as the keys of
//! every repository operation.
//!
//! On the wire JSON:API carries ids as strings, so references between
//! resources ([`ResourceRef`]) keep the id in its string form and parse it into
//! the typed identifier only when a typed lookup is needed.

use crate::framework::error::{WriteError, WriteResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::atomic::{AtomicI32, Ordering};
use uuid::Uuid;

/// Identifier type used by resource types that don't declare their own.
pub type DefaultId = i32;

/// Trait for values that can key a resource.
///
/// Constructing an identifier from an invalid representation fails with
/// [`WriteError::Validation`].
pub trait ResourceId: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static {
    /// Parse the wire (string) form of an identifier.
    fn parse(raw: &str) -> WriteResult<Self>;

    /// The one wire spelling of `raw`: `"05"` and `" 5"` both become `"5"`.
    fn canonical(raw: &str) -> WriteResult<String> {
        Self::parse(raw).map(|id| id.to_string())
    }
}

macro_rules! numeric_id {
    ($($ty:ty),*) => {
        $(
            impl ResourceId for $ty {
                fn parse(raw: &str) -> WriteResult<Self> {
                    raw.trim().parse::<$ty>().map_err(|e| {
                        WriteError::validation(format!(
                            "invalid {} identifier '{}': {}",
                            stringify!($ty),
                            raw,
                            e
                        ))
                    })
                }
            }
        )*
    };
}

numeric_id!(i32, i64, u32, u64);

impl ResourceId for String {
    fn parse(raw: &str) -> WriteResult<Self> {
        if raw.trim().is_empty() {
            return Err(WriteError::validation("identifier must not be empty"));
        }
        Ok(raw.to_string())
    }
}

impl ResourceId for Uuid {
    fn parse(raw: &str) -> WriteResult<Self> {
        Uuid::parse_str(raw.trim())
            .map_err(|e| WriteError::validation(format!("invalid uuid '{}': {}", raw, e)))
    }
}

/// Source of server-generated identifiers.
pub trait IdGenerator<I>: Send + Sync {
    fn next_id(&self) -> I;

    /// Called with every client-supplied id that was stored, so later
    /// generated ids skip past it.
    fn observe(&self, _id: &I) {}
}

/// [`IdGenerator`] backed by a plain function, e.g. `IdFn(Uuid::new_v4)`.
pub struct IdFn<F>(pub F);

impl<I, F> IdGenerator<I> for IdFn<F>
where
    F: Fn() -> I + Send + Sync,
{
    fn next_id(&self) -> I {
        (self.0)()
    }
}

/// Sequential integer ids, starting at 1.
#[derive(Debug)]
pub struct Sequence {
    next: AtomicI32,
}

impl Sequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i32) -> Self {
        Self {
            next: AtomicI32::new(first),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator<i32> for Sequence {
    fn next_id(&self) -> i32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn observe(&self, id: &i32) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }
}

/// A resource type with a unique identifier.
pub trait Identifiable {
    /// The identifier type (e.g. `i32`, `String`, `Uuid`).
    type Id: ResourceId;

    /// The JSON:API type name, e.g. `"articles"`.
    const TYPE_NAME: &'static str;

    fn id(&self) -> &Self::Id;

    /// Reference to this resource, carrying identity only.
    fn reference(&self) -> ResourceRef {
        ResourceRef::new(Self::TYPE_NAME, self.id())
    }
}

/// Identity-only pointer to a resource (`{"type": .., "id": ..}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(resource_type: impl Into<String>, id: impl Display) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Reference to the resource of type `T` keyed by `id`.
    pub fn to<T: Identifiable>(id: &T::Id) -> Self {
        Self::new(T::TYPE_NAME, id)
    }

    /// Parse the referenced id into a typed identifier.
    pub fn parse_id<I: ResourceId>(&self) -> WriteResult<I> {
        I::parse(&self.id)
    }

    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type == resource_type
    }
}

impl Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}
