//! Task workflow engine: the only entry point for task status changes.

use crate::error::{ClassifiedError, ErrorKind};
use crate::identity::domain::UserId;
use crate::organization::domain::BatchId;
use crate::store::{EntityKind, RepositoryError};
use crate::task::{
    domain::{
        CreateTaskRequest, LedgerViolation, Task, TaskDomainError, TaskId, TaskTransition,
        TransitionGraph, TransitionPlan, TransitionRequest, verify_ledger,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for workflow operations.
#[derive(Debug, Error)]
pub enum TaskWorkflowError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed or rejected the change under lock.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The stored ledger disagrees with its task.
    #[error("ledger for task {task_id} is inconsistent: {violation}")]
    CorruptLedger {
        /// Audited task.
        task_id: TaskId,
        /// First violation found.
        violation: LedgerViolation,
    },
}

impl From<RepositoryError> for TaskWorkflowError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(TaskRepositoryError::Store(err))
    }
}

impl ClassifiedError for TaskWorkflowError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::CorruptLedger { .. } => ErrorKind::Unclassified,
        }
    }
}

/// Result type for workflow service operations.
pub type TaskWorkflowResult<T> = Result<T, TaskWorkflowError>;

/// Orchestrates task creation, status transitions and ownership changes.
///
/// Transitions are validated by the repository while it holds the task
/// lock. A graph passed with the request takes precedence over the service
/// default; with neither, any status in the batch vocabulary is reachable.
pub struct TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    default_graph: Option<TransitionGraph>,
}

impl<R, C> Clone for TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            default_graph: self.default_graph.clone(),
        }
    }
}

impl<R, C> TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service that applies the open policy by default.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            default_graph: None,
        }
    }

    /// Restricts transitions to `graph` unless a request supplies its own.
    #[must_use]
    pub fn with_default_graph(mut self, graph: TransitionGraph) -> Self {
        self.default_graph = Some(graph);
        self
    }

    /// Returns the service-wide graph, if configured.
    #[must_use]
    pub const fn default_graph(&self) -> Option<&TransitionGraph> {
        self.default_graph.as_ref()
    }

    /// Creates a task and its initial ledger entry.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` when the batch is missing or archived or a
    /// referenced user does not exist, and `InvalidTransition` when the
    /// initial status is outside the batch vocabulary.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskWorkflowResult<Task> {
        let (task, initial) = Task::create(request, &*self.clock);
        let entry = self
            .repository
            .create_with_initial_transition(&task, &initial)
            .await?;
        info!(
            task_id = %task.id(),
            batch_id = %task.batch_id(),
            status = %task.current_status(),
            transition_id = %entry.id(),
            "created task"
        );
        Ok(task)
    }

    /// Moves a task to a new status and records the change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or soft-deleted task,
    /// `InvalidTransition` when the status is outside the vocabulary or
    /// unreachable, and `Conflict` when the caller's expected status is
    /// stale or a referenced user does not exist.
    pub async fn transition(
        &self,
        request: TransitionRequest,
        graph: Option<TransitionGraph>,
    ) -> TaskWorkflowResult<Task> {
        let task_id = request.task_id();
        let plan = TransitionPlan::new(request, graph.or_else(|| self.default_graph.clone()));
        match self.repository.apply_transition(&plan, self.clock.utc()).await {
            Ok((task, entry)) => {
                info!(
                    task_id = %task_id,
                    transition_id = %entry.id(),
                    from = entry.from_status().map_or("", |status| status.as_str()),
                    to = %entry.to_status(),
                    "transitioned task"
                );
                Ok(task)
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "transition rejected");
                Err(err.into())
            }
        }
    }

    /// Replaces the task owner without recording a transition.
    ///
    /// `None` clears the owner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or soft-deleted task and `Conflict`
    /// when the owner does not exist.
    pub async fn reassign_owner(
        &self,
        task_id: TaskId,
        owner: Option<UserId>,
    ) -> TaskWorkflowResult<Task> {
        let task = self
            .repository
            .reassign_owner(task_id, owner, self.clock.utc())
            .await?;
        info!(task_id = %task_id, owner = ?owner.map(UserId::into_inner), "reassigned task");
        Ok(task)
    }

    /// Soft-deletes a task, keeping its ledger.
    ///
    /// Returns `false` when the task was already deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn soft_delete_task(&self, task_id: TaskId) -> TaskWorkflowResult<bool> {
        let deleted = self.repository.soft_delete(task_id, self.clock.utc()).await?;
        info!(task_id = %task_id, deleted, "soft-deleted task");
        Ok(deleted)
    }

    /// Returns the task's ledger, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn get_history(&self, task_id: TaskId) -> TaskWorkflowResult<Vec<TaskTransition>> {
        let history = self.repository.history(task_id).await?;
        debug!(task_id = %task_id, entries = history.len(), "loaded task history");
        Ok(history)
    }

    /// Returns a task, including a soft-deleted one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskWorkflowResult<Task> {
        debug!(task_id = %task_id, "loading task");
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, task_id).into())
    }

    /// Lists a batch's tasks ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::Repository`] when the lookup fails.
    pub async fn list_tasks(
        &self,
        batch_id: BatchId,
        include_deleted: bool,
    ) -> TaskWorkflowResult<Vec<Task>> {
        let tasks = self
            .repository
            .list_for_batch(batch_id, include_deleted)
            .await?;
        debug!(batch_id = %batch_id, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    /// Loads a task with its ledger and checks that they agree.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist and
    /// [`TaskWorkflowError::CorruptLedger`] when an invariant is broken.
    pub async fn audit_task(&self, task_id: TaskId) -> TaskWorkflowResult<Vec<TaskTransition>> {
        let task = self.get_task(task_id).await?;
        let history = self.repository.history(task_id).await?;
        verify_ledger(&history, &task).map_err(|violation| {
            warn!(task_id = %task_id, %violation, "ledger audit failed");
            TaskWorkflowError::CorruptLedger { task_id, violation }
        })?;
        Ok(history)
    }
}
