//! Project aggregate owned by an organization.

use super::{OrganizationDomainError, OrganizationId, ProjectId, RecordName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project accepts new batches.
    Active,
    /// Project is retained for history only.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = OrganizationDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            _ => Err(OrganizationDomainError::UnknownProjectStatus(
                value.to_owned(),
            )),
        }
    }
}

/// Free-form project kind, for example `image_classification`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKind(String);

impl ProjectKind {
    /// Creates a validated project kind.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationDomainError::EmptyProjectKind`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, OrganizationDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(OrganizationDomainError::EmptyProjectKind);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    organization_id: OrganizationId,
    name: RecordName,
    status: ProjectStatus,
    kind: ProjectKind,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted identifier.
    pub id: ProjectId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Name, unique within the organization.
    pub name: RecordName,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Project kind.
    pub kind: ProjectKind,
    /// Free-form metadata.
    pub metadata: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a project. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New name.
    pub name: Option<RecordName>,
    /// New kind.
    pub kind: Option<ProjectKind>,
    /// New status.
    pub status: Option<ProjectStatus>,
    /// New metadata; `Some(None)` clears it.
    pub metadata: Option<Option<Value>>,
}

impl ProjectPatch {
    /// Returns `true` when the patch carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.status.is_none() && self.metadata.is_none()
    }
}

impl Project {
    /// Creates a new active project in the given organization.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        name: RecordName,
        kind: ProjectKind,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProjectId::new(),
            organization_id,
            name,
            status: ProjectStatus::Active,
            kind,
            metadata: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Attaches free-form metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            organization_id: data.organization_id,
            name: data.name,
            status: data.status,
            kind: data.kind,
            metadata: data.metadata,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &RecordName {
        &self.name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the project kind.
    #[must_use]
    pub const fn kind(&self) -> &ProjectKind {
        &self.kind
    }

    /// Returns the free-form metadata, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
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
    pub fn apply_patch(&mut self, patch: &ProjectPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(kind) = &patch.kind {
            self.kind = kind.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata.clone_from(metadata);
        }
        self.updated_at = at;
    }
}
