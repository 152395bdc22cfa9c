//! Error types for identity domain validation.

use crate::error::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Errors returned while constructing identity domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The username exceeds the column width.
    #[error("username '{0}' exceeds 150 characters")]
    UsernameTooLong(String),

    /// The username contains whitespace.
    #[error("username '{0}' must not contain whitespace")]
    InvalidUsername(String),

    /// The identity provider is empty after trimming.
    #[error("identity provider must not be empty")]
    EmptyProvider,

    /// The provider subject is empty after trimming.
    #[error("identity subject must not be empty")]
    EmptySubject,

    /// The portfolio display name is empty after trimming.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// The password hash or its method is empty.
    #[error("password hash and hash method must not be empty")]
    EmptyPasswordCredential,
}

impl ClassifiedError for IdentityDomainError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
