//! Batch aggregate: a named grouping of tasks carrying workflow settings.

use super::{BatchId, OrganizationDomainError, ProjectId, RecordName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Batch lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Batch is being prepared.
    Draft,
    /// Batch tasks are being worked on.
    Processing,
    /// All batch work is complete.
    Completed,
    /// Batch is retained for history and accepts no new tasks.
    Archived,
}

impl BatchStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Returns `true` when the batch no longer accepts new tasks.
    #[must_use]
    pub const fn is_archived(self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl TryFrom<&str> for BatchStatus {
    type Error = OrganizationDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(OrganizationDomainError::UnknownBatchStatus(value.to_owned())),
        }
    }
}

/// Structured batch configuration stored as a JSON object.
///
/// The `workflow` key holds the task status vocabulary, for example
/// `{"workflow": {"statuses": ["pending", "in_review", "done"]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchSettings(Value);

impl BatchSettings {
    /// Wraps a JSON object as batch settings.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationDomainError::SettingsNotObject`] when the value
    /// is not a JSON object.
    pub fn new(value: Value) -> Result<Self, OrganizationDomainError> {
        if !value.is_object() {
            return Err(OrganizationDomainError::SettingsNotObject);
        }
        Ok(Self(value))
    }

    /// Returns the value stored under a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the settings as a JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the settings, returning the JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

/// Batch aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    project_id: ProjectId,
    name: RecordName,
    status: BatchStatus,
    settings: BatchSettings,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBatchData {
    /// Persisted identifier.
    pub id: BatchId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Name, unique within the project.
    pub name: RecordName,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Structured configuration.
    pub settings: BatchSettings,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a batch. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPatch {
    /// New name.
    pub name: Option<RecordName>,
    /// New status.
    pub status: Option<BatchStatus>,
    /// Replacement settings.
    pub settings: Option<BatchSettings>,
}

impl BatchPatch {
    /// Returns `true` when the patch carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.settings.is_none()
    }
}

impl Batch {
    /// Creates a new draft batch in the given project.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        name: RecordName,
        settings: BatchSettings,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: BatchId::new(),
            project_id,
            name,
            status: BatchStatus::Draft,
            settings,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a batch from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBatchData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            name: data.name,
            status: data.status,
            settings: data.settings,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the batch identifier.
    #[must_use]
    pub const fn id(&self) -> BatchId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the batch name.
    #[must_use]
    pub const fn name(&self) -> &RecordName {
        &self.name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> BatchStatus {
        self.status
    }

    /// Returns the batch settings.
    #[must_use]
    pub const fn settings(&self) -> &BatchSettings {
        &self.settings
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
    pub fn apply_patch(&mut self, patch: &BatchPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(settings) = &patch.settings {
            self.settings = settings.clone();
        }
        self.updated_at = at;
    }
}
