//! Ledger entries and the rules for moving a task between statuses.

use super::{StatusVocabulary, Task, TaskDomainError, TaskId, TaskStatus, TransitionGraph, TransitionId};
use crate::identity::domain::UserId;
use crate::organization::domain::BatchSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable ledger entry recording one status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTransition {
    id: TransitionId,
    task_id: TaskId,
    actor_id: Option<UserId>,
    from_status: Option<TaskStatus>,
    to_status: TaskStatus,
    owner: Option<UserId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTransitionData {
    /// Store-assigned sequence identifier.
    pub id: TransitionId,
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// Acting user, cleared when the user is deleted.
    pub actor_id: Option<UserId>,
    /// Status before the change; `None` for the initial entry.
    pub from_status: Option<TaskStatus>,
    /// Status after the change.
    pub to_status: TaskStatus,
    /// Owner after the change, cleared when the user is deleted.
    pub owner: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskTransition {
    /// Reconstructs a ledger entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTransitionData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            actor_id: data.actor_id,
            from_status: data.from_status,
            to_status: data.to_status,
            owner: data.owner,
            created_at: data.created_at,
        }
    }

    /// Returns the sequence identifier.
    #[must_use]
    pub const fn id(&self) -> TransitionId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user, if still present.
    #[must_use]
    pub const fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    /// Returns the status before the change.
    #[must_use]
    pub const fn from_status(&self) -> Option<&TaskStatus> {
        self.from_status.as_ref()
    }

    /// Returns the status after the change.
    #[must_use]
    pub const fn to_status(&self) -> &TaskStatus {
        &self.to_status
    }

    /// Returns the owner after the change, if still present.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` for the entry that created the task.
    #[must_use]
    pub const fn is_initial(&self) -> bool {
        self.from_status.is_none()
    }

    pub(crate) fn detach_user(&mut self, user: UserId) {
        if self.actor_id == Some(user) {
            self.actor_id = None;
        }
        if self.owner == Some(user) {
            self.owner = None;
        }
    }
}

/// Ledger entry before the store assigns its sequence identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskTransition {
    task_id: TaskId,
    actor_id: Option<UserId>,
    from_status: Option<TaskStatus>,
    to_status: TaskStatus,
    owner: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl NewTaskTransition {
    pub(crate) const fn initial(
        task_id: TaskId,
        actor_id: Option<UserId>,
        to_status: TaskStatus,
        owner: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            actor_id,
            from_status: None,
            to_status,
            owner,
            created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    /// Returns the status before the change.
    #[must_use]
    pub const fn from_status(&self) -> Option<&TaskStatus> {
        self.from_status.as_ref()
    }

    /// Returns the status after the change.
    #[must_use]
    pub const fn to_status(&self) -> &TaskStatus {
        &self.to_status
    }

    /// Returns the owner after the change.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completes the entry with its store-assigned identifier.
    #[must_use]
    pub fn into_transition(self, id: TransitionId) -> TaskTransition {
        TaskTransition {
            id,
            task_id: self.task_id,
            actor_id: self.actor_id,
            from_status: self.from_status,
            to_status: self.to_status,
            owner: self.owner,
            created_at: self.created_at,
        }
    }
}

/// Caller input for a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    task_id: TaskId,
    actor: UserId,
    to_status: TaskStatus,
    owner: Option<UserId>,
    expected_status: Option<TaskStatus>,
}

impl TransitionRequest {
    /// Creates a request that chains onto whatever status the task holds.
    #[must_use]
    pub const fn new(task_id: TaskId, actor: UserId, to_status: TaskStatus) -> Self {
        Self {
            task_id,
            actor,
            to_status,
            owner: None,
            expected_status: None,
        }
    }

    /// Hands the task to a new owner as part of the transition.
    #[must_use]
    pub const fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Rejects the transition unless the task currently holds `status`.
    #[must_use]
    pub fn expecting(mut self, status: TaskStatus) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        self.actor
    }

    /// Returns the requested status.
    #[must_use]
    pub const fn to_status(&self) -> &TaskStatus {
        &self.to_status
    }

    /// Returns the requested owner, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Returns the status the caller assumed, if any.
    #[must_use]
    pub const fn expected_status(&self) -> Option<&TaskStatus> {
        self.expected_status.as_ref()
    }
}

/// A transition request bound to the graph it must respect.
///
/// Repositories call [`TransitionPlan::apply`] while holding the task lock so
/// the rules are checked against the committed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    request: TransitionRequest,
    graph: Option<TransitionGraph>,
}

impl TransitionPlan {
    /// Creates a plan; `None` applies the open policy.
    #[must_use]
    pub const fn new(request: TransitionRequest, graph: Option<TransitionGraph>) -> Self {
        Self { request, graph }
    }

    /// Returns the underlying request.
    #[must_use]
    pub const fn request(&self) -> &TransitionRequest {
        &self.request
    }

    /// Returns the graph, if one restricts the transition.
    #[must_use]
    pub const fn graph(&self) -> Option<&TransitionGraph> {
        self.graph.as_ref()
    }

    /// Validates the transition against the locked task and moves it.
    ///
    /// On success the task holds the requested status and the returned
    /// ledger entry records the previous one. On failure the task is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskDeleted`],
    /// [`TaskDomainError::StaleStatus`],
    /// [`TaskDomainError::MalformedWorkflowSettings`],
    /// [`TaskDomainError::StatusNotInVocabulary`] or
    /// [`TaskDomainError::UnreachableStatus`].
    pub fn apply(
        &self,
        task: &mut Task,
        settings: &BatchSettings,
        at: DateTime<Utc>,
    ) -> Result<NewTaskTransition, TaskDomainError> {
        let to_status = self.request.to_status();
        if task.is_deleted() {
            return Err(TaskDomainError::TaskDeleted(task.id()));
        }
        if let Some(expected) = self.request.expected_status()
            && expected != task.current_status()
        {
            return Err(TaskDomainError::StaleStatus {
                expected: expected.clone(),
                actual: task.current_status().clone(),
            });
        }

        StatusVocabulary::from_batch_settings(settings)?.ensure_allows(to_status)?;

        if let Some(graph) = &self.graph
            && !graph.is_reachable(task.current_status(), to_status)
        {
            return Err(TaskDomainError::UnreachableStatus {
                from: task.current_status().clone(),
                to: to_status.clone(),
            });
        }

        let previous = task.move_to(to_status.clone(), self.request.owner(), at);
        Ok(NewTaskTransition {
            task_id: task.id(),
            actor_id: Some(self.request.actor()),
            from_status: Some(previous),
            to_status: to_status.clone(),
            owner: task.current_owner(),
            created_at: at,
        })
    }
}
