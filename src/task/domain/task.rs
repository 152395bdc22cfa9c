//! Task aggregate root.

use super::{NewTaskTransition, TaskDomainError, TaskId, TaskStatus};
use crate::identity::domain::UserId;
use crate::organization::domain::BatchId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum task name length, matching the `VARCHAR(255)` column.
const MAX_TASK_NAME_LENGTH: usize = 255;

/// Trimmed, non-empty task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] or
    /// [`TaskDomainError::TaskNameTooLong`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        if normalized.chars().count() > MAX_TASK_NAME_LENGTH {
            return Err(TaskDomainError::TaskNameTooLong(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    batch_id: BatchId,
    name: TaskName,
    initial_status: TaskStatus,
    owner: Option<UserId>,
    actor: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request without owner or actor.
    #[must_use]
    pub const fn new(batch_id: BatchId, name: TaskName, initial_status: TaskStatus) -> Self {
        Self {
            batch_id,
            name,
            initial_status,
            owner: None,
            actor: None,
        }
    }

    /// Sets the initial owner.
    #[must_use]
    pub const fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Records who created the task on the initial ledger entry.
    #[must_use]
    pub const fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns the target batch.
    #[must_use]
    pub const fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the initial status.
    #[must_use]
    pub const fn initial_status(&self) -> &TaskStatus {
        &self.initial_status
    }

    /// Returns the initial owner, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Returns the creating actor, if any.
    #[must_use]
    pub const fn actor(&self) -> Option<UserId> {
        self.actor
    }
}

/// Task aggregate root.
///
/// `current_status` always mirrors the `to_status` of the latest ledger
/// entry; only [`super::TransitionPlan::apply`] moves it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    batch_id: BatchId,
    name: TaskName,
    is_deleted: bool,
    current_status: TaskStatus,
    current_owner: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Owning batch.
    pub batch_id: BatchId,
    /// Task name.
    pub name: TaskName,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Current workflow status.
    pub current_status: TaskStatus,
    /// Current owner, if any.
    pub current_owner: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task together with its initial ledger entry.
    #[must_use]
    pub fn create(request: CreateTaskRequest, clock: &impl Clock) -> (Self, NewTaskTransition) {
        let timestamp = clock.utc();
        let task = Self {
            id: TaskId::new(),
            batch_id: request.batch_id,
            name: request.name,
            is_deleted: false,
            current_status: request.initial_status.clone(),
            current_owner: request.owner,
            created_at: timestamp,
            updated_at: timestamp,
        };
        let initial = NewTaskTransition::initial(
            task.id,
            request.actor,
            request.initial_status,
            request.owner,
            timestamp,
        );
        (task, initial)
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            batch_id: data.batch_id,
            name: data.name,
            is_deleted: data.is_deleted,
            current_status: data.current_status,
            current_owner: data.current_owner,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning batch.
    #[must_use]
    pub const fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns whether the task is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Returns the current workflow status.
    #[must_use]
    pub const fn current_status(&self) -> &TaskStatus {
        &self.current_status
    }

    /// Returns the current owner, if any.
    #[must_use]
    pub const fn current_owner(&self) -> Option<UserId> {
        self.current_owner
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

    /// Replaces the owner without recording a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskDeleted`] for a soft-deleted task.
    pub const fn reassign(
        &mut self,
        owner: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if self.is_deleted {
            return Err(TaskDomainError::TaskDeleted(self.id));
        }
        self.current_owner = owner;
        self.updated_at = at;
        Ok(())
    }

    /// Sets the soft-delete flag.
    ///
    /// Returns `false` when the task was already deleted.
    pub const fn mark_deleted(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        self.updated_at = at;
        true
    }

    /// Clears the owner after the owning user was removed.
    pub(crate) fn detach_owner(&mut self, user: UserId) {
        if self.current_owner == Some(user) {
            self.current_owner = None;
        }
    }

    pub(crate) fn move_to(
        &mut self,
        status: TaskStatus,
        owner: Option<UserId>,
        at: DateTime<Utc>,
    ) -> TaskStatus {
        if owner.is_some() {
            self.current_owner = owner;
        }
        self.updated_at = at;
        std::mem::replace(&mut self.current_status, status)
    }
}
