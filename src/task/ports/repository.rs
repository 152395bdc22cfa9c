//! Repository port for tasks and their transition ledger.

use crate::error::{ClassifiedError, ErrorKind};
use crate::identity::domain::UserId;
use crate::organization::domain::BatchId;
use crate::store::{ConflictReason, EntityKind, RepositoryError};
use crate::task::domain::{
    NewTaskTransition, Task, TaskDomainError, TaskId, TaskTransition, TransitionPlan,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task and ledger persistence contract.
///
/// Every mutating call is one atomic unit: the task row and its ledger entry
/// commit together or not at all.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and its initial ledger entry.
    ///
    /// # Errors
    ///
    /// Returns a store `Conflict` when the batch is missing or archived, or
    /// when the owner or actor does not exist. Returns
    /// [`TaskRepositoryError::Rejected`] when the initial status is outside
    /// the batch vocabulary.
    async fn create_with_initial_transition(
        &self,
        task: &Task,
        initial: &NewTaskTransition,
    ) -> TaskRepositoryResult<TaskTransition>;

    /// Locks the task, applies the plan and appends the ledger entry.
    ///
    /// # Errors
    ///
    /// Returns a store `NotFound` when the task does not exist and
    /// [`TaskRepositoryError::Rejected`] when the plan's rules fail against
    /// the locked state.
    async fn apply_transition(
        &self,
        plan: &TransitionPlan,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<(Task, TaskTransition)>;

    /// Finds a task by identifier, including soft-deleted tasks.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists a batch's tasks ordered by creation time.
    async fn list_for_batch(
        &self,
        batch_id: BatchId,
        include_deleted: bool,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Replaces the task owner without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns a store `NotFound` for a missing task,
    /// [`TaskDomainError::TaskDeleted`] for a soft-deleted one and a store
    /// `Conflict` when the new owner does not exist.
    async fn reassign_owner(
        &self,
        id: TaskId,
        owner: Option<UserId>,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Sets the soft-delete flag, returning `false` if it was already set.
    ///
    /// # Errors
    ///
    /// Returns a store `NotFound` when the task does not exist.
    async fn soft_delete(&self, id: TaskId, at: DateTime<Utc>) -> TaskRepositoryResult<bool>;

    /// Returns the task's ledger ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns a store `NotFound` when the task does not exist.
    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskTransition>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// Workflow rules rejected the change under lock.
    #[error(transparent)]
    Rejected(TaskDomainError),

    /// The store failed or reported a constraint violation.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl From<TaskDomainError> for TaskRepositoryError {
    /// Stale expected statuses become [`ConflictReason::StaleStatus`].
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::StaleStatus { expected, actual } => {
                Self::Store(RepositoryError::conflict(
                    EntityKind::Task,
                    ConflictReason::StaleStatus {
                        expected: expected.as_str().to_owned(),
                        actual: actual.as_str().to_owned(),
                    },
                ))
            }
            other => Self::Rejected(other),
        }
    }
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(RepositoryError::persistence(err))
    }
}

impl ClassifiedError for TaskRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected(err) => err.kind(),
            Self::Store(err) => err.kind(),
        }
    }
}
