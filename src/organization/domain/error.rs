//! Error types for organization domain validation and parsing.

use crate::error::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Errors returned while constructing organization, project and batch values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrganizationDomainError {
    /// A record name is empty after trimming.
    #[error("name must not be empty")]
    EmptyName,

    /// A record name exceeds the column width.
    #[error("name '{0}' exceeds 255 characters")]
    NameTooLong(String),

    /// The project kind is empty after trimming.
    #[error("project kind must not be empty")]
    EmptyProjectKind,

    /// The organization kind is not recognised.
    #[error("unknown organization kind: {0}")]
    UnknownOrganizationKind(String),

    /// The project status is not recognised.
    #[error("unknown project status: {0}")]
    UnknownProjectStatus(String),

    /// The batch status is not recognised.
    #[error("unknown batch status: {0}")]
    UnknownBatchStatus(String),

    /// Batch settings must be a JSON object.
    #[error("batch settings must be a JSON object")]
    SettingsNotObject,
}

impl ClassifiedError for OrganizationDomainError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
