//! Error classification shared by every repository and service error.
//!
//! Callers branch on [`ErrorKind`] rather than on message text. Each error
//! type in the crate reports its kind through [`ClassifiedError`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse error category used for dispatch and outward status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// A uniqueness, reference or concurrency rule was violated.
    Conflict,
    /// The requested status is outside the vocabulary or not reachable.
    InvalidTransition,
    /// The input was malformed or empty.
    Validation,
    /// Infrastructure failure that could not be classified further.
    Unclassified,
}

impl ErrorKind {
    /// Returns the HTTP-equivalent status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidTransition | Self::Validation => 400,
            Self::Unclassified => 500,
        }
    }

    /// Returns the canonical machine-readable code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidTransition => "invalid_transition",
            Self::Validation => "validation",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can report their [`ErrorKind`].
pub trait ClassifiedError: std::error::Error {
    /// Returns the category of this error.
    fn kind(&self) -> ErrorKind;
}
