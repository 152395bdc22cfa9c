//! Organization aggregate and its kind.

use super::{OrganizationDomainError, OrganizationId, RecordName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Role an organization plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    /// Customer commissioning annotation work.
    Client,
    /// Workforce vendor performing annotation work.
    Vendor,
    /// Platform-internal organization.
    Internal,
}

impl OrganizationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
            Self::Internal => "internal",
        }
    }
}

impl TryFrom<&str> for OrganizationKind {
    type Error = OrganizationDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "vendor" => Ok(Self::Vendor),
            "internal" => Ok(Self::Internal),
            _ => Err(OrganizationDomainError::UnknownOrganizationKind(
                value.to_owned(),
            )),
        }
    }
}

/// Organization aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: RecordName,
    kind: OrganizationKind,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrganizationData {
    /// Persisted identifier.
    pub id: OrganizationId,
    /// Persisted unique name.
    pub name: RecordName,
    /// Persisted kind.
    pub kind: OrganizationKind,
    /// Persisted active flag.
    pub is_active: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an organization. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationPatch {
    /// New unique name.
    pub name: Option<RecordName>,
    /// New kind.
    pub kind: Option<OrganizationKind>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl OrganizationPatch {
    /// Returns `true` when the patch carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.is_active.is_none()
    }
}

impl Organization {
    /// Creates a new active organization.
    #[must_use]
    pub fn new(name: RecordName, kind: OrganizationKind, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OrganizationId::new(),
            name,
            kind,
            is_active: true,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Overrides the initial active flag.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Reconstructs an organization from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOrganizationData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            kind: data.kind,
            is_active: data.is_active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the organization identifier.
    #[must_use]
    pub const fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the unique organization name.
    #[must_use]
    pub const fn name(&self) -> &RecordName {
        &self.name
    }

    /// Returns the organization kind.
    #[must_use]
    pub const fn kind(&self) -> OrganizationKind {
        self.kind
    }

    /// Returns whether the organization is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
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
    pub fn apply_patch(&mut self, patch: &OrganizationPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = at;
    }
}
