//! # Write Errors
//!
//! This module defines the error taxonomy shared by the repository, the write
//! service and the command facade. Every failure is a contract outcome that is
//! handed back to the caller unchanged; nothing in this crate retries.

/// Convenience alias used by every write-side contract.
pub type WriteResult<T> = Result<T, WriteError>;

/// Errors that can occur while mutating resources.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WriteError {
    /// The target resource does not exist.
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: String, id: String },

    /// A resource referenced from a relationship does not exist.
    #[error("Related {resource_type} {id} for relationship '{relationship}' not found")]
    RelationshipNotFound {
        relationship: String,
        resource_type: String,
        id: String,
    },

    /// A uniqueness or foreign-key rule of the storage engine was broken.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The optimistic-concurrency token did not match the stored version.
    #[error("Concurrency conflict on {resource_type} {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        resource_type: String,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Transient backend failure.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed identifier or input shape. Raised before any storage call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller cancelled the operation before anything was applied.
    #[error("Operation cancelled")]
    Cancelled,
}

impl WriteError {
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn relationship_not_found(
        relationship: impl Into<String>,
        resource_type: impl Into<String>,
        id: impl ToString,
    ) -> Self {
        Self::RelationshipNotFound {
            relationship: relationship.into(),
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// True for failures the caller may resolve by re-fetching and retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::StorageUnavailable(_)
        )
    }
}
