//! Validated record name shared by organizations, projects and batches.

use super::OrganizationDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a record name, matching the `VARCHAR(255)` columns.
const MAX_NAME_LENGTH: usize = 255;

/// Trimmed, non-empty record name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordName(String);

impl RecordName {
    /// Creates a validated record name.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationDomainError::EmptyName`] when the value is empty
    /// after trimming, or [`OrganizationDomainError::NameTooLong`] when it
    /// exceeds 255 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, OrganizationDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(OrganizationDomainError::EmptyName);
        }
        if normalized.chars().count() > MAX_NAME_LENGTH {
            return Err(OrganizationDomainError::NameTooLong(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
