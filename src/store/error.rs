//! Repository error taxonomy shared by every adapter.
//!
//! Store-level integrity failures (unique keys, restricted deletes, missing
//! parents) surface as [`RepositoryError::Conflict`] with a typed
//! [`ConflictReason`]; raw driver errors never leave an adapter.

use crate::error::{ClassifiedError, ErrorKind};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persisted entity named in repository errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Organization record.
    Organization,
    /// Project record.
    Project,
    /// Batch record.
    Batch,
    /// Task record.
    Task,
    /// Task transition ledger entry.
    TaskTransition,
    /// User record.
    User,
    /// Authentication identity record.
    AuthIdentity,
    /// User portfolio record.
    Portfolio,
}

impl EntityKind {
    /// Returns the lowercase entity name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Batch => "batch",
            Self::Task => "task",
            Self::TaskTransition => "task transition",
            Self::User => "user",
            Self::AuthIdentity => "auth identity",
            Self::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a write conflicted with the stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// A unique key is already taken.
    Duplicate(String),
    /// A referenced parent or user does not exist.
    MissingReference(EntityKind),
    /// The record still has children of the given kind.
    HasDependents(EntityKind),
    /// The record is archived and accepts no new children.
    Archived,
    /// The caller expected a status the record no longer has.
    StaleStatus {
        /// Status the caller assumed.
        expected: String,
        /// Status observed under lock.
        actual: String,
    },
    /// The store aborted the transaction to keep it serializable.
    Serialization,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(key) => write!(f, "duplicate key '{key}'"),
            Self::MissingReference(entity) => write!(f, "referenced {entity} does not exist"),
            Self::HasDependents(entity) => write!(f, "dependent {entity} records exist"),
            Self::Archived => f.write_str("record is archived"),
            Self::StaleStatus { expected, actual } => {
                write!(f, "expected status '{expected}' but found '{actual}'")
            }
            Self::Serialization => f.write_str("concurrent update, retry the operation"),
        }
    }
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The addressed record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity that was looked up.
        entity: EntityKind,
        /// Key used for the lookup.
        key: String,
    },

    /// The write violated a store-level constraint.
    #[error("{entity} conflict: {reason}")]
    Conflict {
        /// Entity whose write conflicted.
        entity: EntityKind,
        /// Constraint that was violated.
        reason: ConflictReason,
    },

    /// The request was malformed, for example an empty patch.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Builds a not-found error for the given entity and key.
    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Builds a conflict error.
    #[must_use]
    pub const fn conflict(entity: EntityKind, reason: ConflictReason) -> Self {
        Self::Conflict { entity, reason }
    }

    /// Builds a duplicate-key conflict.
    pub fn duplicate(entity: EntityKind, key: impl fmt::Display) -> Self {
        Self::conflict(entity, ConflictReason::Duplicate(key.to_string()))
    }

    /// Builds a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Rejects an update whose patch carries no fields.
    #[must_use]
    pub fn empty_patch(entity: EntityKind) -> Self {
        Self::validation(format!("no fields provided to update {entity}"))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when the error is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the conflict reason when the error is a conflict.
    #[must_use]
    pub const fn conflict_reason(&self) -> Option<&ConflictReason> {
        match self {
            Self::Conflict { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl ClassifiedError for RepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Persistence(_) => ErrorKind::Unclassified,
        }
    }
}
