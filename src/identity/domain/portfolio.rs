//! User portfolios.

use super::{IdentityDomainError, PortfolioId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty portfolio display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Creates a validated display name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyDisplayName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyDisplayName);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the display name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portfolio before the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPortfolio {
    user_id: UserId,
    display_name: DisplayName,
    created_at: DateTime<Utc>,
}

impl NewPortfolio {
    /// Creates a portfolio draft for the user.
    #[must_use]
    pub fn new(user_id: UserId, display_name: DisplayName, clock: &impl Clock) -> Self {
        Self {
            user_id,
            display_name,
            created_at: clock.utc(),
        }
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completes the portfolio with its store-assigned identifier.
    #[must_use]
    pub fn into_portfolio(self, id: PortfolioId) -> Portfolio {
        Portfolio {
            id,
            user_id: self.user_id,
            display_name: self.display_name,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Persisted user portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    id: PortfolioId,
    user_id: UserId,
    display_name: DisplayName,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted portfolio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPortfolioData {
    /// Store-assigned identifier.
    pub id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub display_name: DisplayName,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a portfolio. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioPatch {
    /// New display name.
    pub display_name: Option<DisplayName>,
}

impl PortfolioPatch {
    /// Returns `true` when the patch carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none()
    }
}

impl Portfolio {
    /// Reconstructs a portfolio from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPortfolioData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            display_name: data.display_name,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the portfolio identifier.
    #[must_use]
    pub const fn id(&self) -> PortfolioId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update and stamps `updated_at`.
    pub fn apply_patch(&mut self, patch: &PortfolioPatch, at: DateTime<Utc>) {
        if let Some(display_name) = &patch.display_name {
            self.display_name = display_name.clone();
        }
        self.updated_at = at;
    }
}
