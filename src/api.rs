//! Request validation and dispatch into the task workflow engine.
//!
//! Payloads arrive with identifiers as strings; this layer parses them,
//! builds validated domain requests and maps every failure onto an
//! [`ApiError`] carrying its [`ErrorKind`] and HTTP-equivalent status. The
//! transport that delivers payloads is out of scope.

use crate::error::{ClassifiedError, ErrorKind};
use crate::identity::domain::UserId;
use crate::organization::domain::BatchId;
use crate::task::{
    domain::{
        CreateTaskRequest, Task, TaskId, TaskName, TaskStatus, TaskTransition, TransitionGraph,
        TransitionRequest,
    },
    ports::TaskRepository,
    services::TaskWorkflowService,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Failure returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ApiError {
    /// HTTP-equivalent status code.
    pub status: u16,
    /// Machine-readable category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ApiError {
    /// Builds an error from any classified crate error.
    #[must_use]
    pub fn from_classified(err: &impl ClassifiedError) -> Self {
        let kind = err.kind();
        Self {
            status: kind.status_code(),
            kind,
            message: err.to_string(),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: ErrorKind::Validation.status_code(),
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Payload for `createTask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    /// Target batch identifier.
    pub batch_id: String,
    /// Task name.
    pub name: String,
    /// Initial workflow status.
    pub initial_status: String,
    /// Initial owner identifier.
    #[serde(default)]
    pub owner: Option<String>,
    /// Creating user identifier.
    #[serde(default)]
    pub actor_id: Option<String>,
}

/// Payload for `transitionTask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionTaskPayload {
    /// Task identifier.
    pub task_id: String,
    /// Acting user identifier.
    pub actor_id: String,
    /// Requested status.
    pub to_status: String,
    /// New owner identifier.
    #[serde(default)]
    pub owner: Option<String>,
    /// Status the caller believes the task holds.
    #[serde(default)]
    pub expected_status: Option<String>,
    /// Adjacency list restricting reachable statuses.
    #[serde(default)]
    pub graph: Option<BTreeMap<String, Vec<String>>>,
}

/// Payload for `reassignTask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignTaskPayload {
    /// Task identifier.
    pub task_id: String,
    /// New owner identifier; `None` clears the owner.
    #[serde(default)]
    pub new_owner: Option<String>,
}

/// Payload addressing a single task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRefPayload {
    /// Task identifier.
    pub task_id: String,
}

/// Payload for listing a batch's tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksPayload {
    /// Batch identifier.
    pub batch_id: String,
    /// Whether soft-deleted tasks are included.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Outcome of `softDeleteTask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoftDeleteOutcome {
    /// `false` when the task was already deleted.
    pub deleted: bool,
}

fn parse_uuid(field: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| ApiError::validation(format!("{field} is not a valid UUID: {err}")))
}

fn parse_user(field: &str, raw: Option<&str>) -> ApiResult<Option<UserId>> {
    raw.map(|value| parse_uuid(field, value).map(UserId::from_uuid))
        .transpose()
}

fn classify<T, E: ClassifiedError>(result: Result<T, E>) -> ApiResult<T> {
    result.map_err(|err| ApiError::from_classified(&err))
}

fn log_failure<T>(operation: &'static str, result: ApiResult<T>) -> ApiResult<T> {
    if let Err(err) = &result {
        warn!(operation, status = err.status, kind = %err.kind, message = %err.message, "request failed");
    }
    result
}

/// Dispatches API payloads to the workflow engine.
pub struct WorkflowApi<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    service: TaskWorkflowService<R, C>,
}

impl<R, C> Clone for WorkflowApi<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<R, C> WorkflowApi<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Wraps a workflow service.
    #[must_use]
    pub const fn new(service: TaskWorkflowService<R, C>) -> Self {
        Self { service }
    }

    /// Handles `createTask`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for malformed fields, otherwise the
    /// workflow engine's classified failure.
    pub async fn create_task(&self, payload: CreateTaskPayload) -> ApiResult<Task> {
        log_failure("createTask", self.dispatch_create(payload).await)
    }

    async fn dispatch_create(&self, payload: CreateTaskPayload) -> ApiResult<Task> {
        let batch_id = BatchId::from_uuid(parse_uuid("batchId", &payload.batch_id)?);
        let name = classify(TaskName::new(payload.name))?;
        let initial_status = classify(TaskStatus::new(payload.initial_status))?;
        let mut request = CreateTaskRequest::new(batch_id, name, initial_status);
        if let Some(owner) = parse_user("owner", payload.owner.as_deref())? {
            request = request.with_owner(owner);
        }
        if let Some(actor) = parse_user("actorId", payload.actor_id.as_deref())? {
            request = request.with_actor(actor);
        }
        info!(operation = "createTask", batch_id = %batch_id, "dispatching");
        classify(self.service.create_task(request).await)
    }

    /// Handles `transitionTask`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for malformed fields, otherwise the
    /// workflow engine's classified failure.
    pub async fn transition_task(&self, payload: TransitionTaskPayload) -> ApiResult<Task> {
        log_failure("transitionTask", self.dispatch_transition(payload).await)
    }

    async fn dispatch_transition(&self, payload: TransitionTaskPayload) -> ApiResult<Task> {
        let task_id = TaskId::from_uuid(parse_uuid("taskId", &payload.task_id)?);
        let actor = UserId::from_uuid(parse_uuid("actorId", &payload.actor_id)?);
        let to_status = classify(TaskStatus::new(payload.to_status))?;
        let mut request = TransitionRequest::new(task_id, actor, to_status);
        if let Some(owner) = parse_user("owner", payload.owner.as_deref())? {
            request = request.with_owner(owner);
        }
        if let Some(expected) = payload.expected_status {
            request = request.expecting(classify(TaskStatus::new(expected))?);
        }
        let graph = payload
            .graph
            .map(|adjacency| classify(TransitionGraph::from_adjacency(adjacency)))
            .transpose()?;
        info!(operation = "transitionTask", task_id = %task_id, "dispatching");
        classify(self.service.transition(request, graph).await)
    }

    /// Handles `getTaskHistory`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed identifier and
    /// `NotFound` for an unknown task.
    pub async fn get_task_history(&self, payload: TaskRefPayload) -> ApiResult<Vec<TaskTransition>> {
        let result = match parse_uuid("taskId", &payload.task_id) {
            Ok(raw) => classify(self.service.get_history(TaskId::from_uuid(raw)).await),
            Err(err) => Err(err),
        };
        log_failure("getTaskHistory", result)
    }

    /// Handles `reassignTask`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for malformed identifiers, otherwise the
    /// workflow engine's classified failure.
    pub async fn reassign_task(&self, payload: ReassignTaskPayload) -> ApiResult<Task> {
        log_failure("reassignTask", self.dispatch_reassign(payload).await)
    }

    async fn dispatch_reassign(&self, payload: ReassignTaskPayload) -> ApiResult<Task> {
        let task_id = TaskId::from_uuid(parse_uuid("taskId", &payload.task_id)?);
        let owner = parse_user("newOwner", payload.new_owner.as_deref())?;
        info!(operation = "reassignTask", task_id = %task_id, "dispatching");
        classify(self.service.reassign_owner(task_id, owner).await)
    }

    /// Handles `softDeleteTask`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed identifier and
    /// `NotFound` for an unknown task.
    pub async fn soft_delete_task(&self, payload: TaskRefPayload) -> ApiResult<SoftDeleteOutcome> {
        let result = match parse_uuid("taskId", &payload.task_id) {
            Ok(raw) => classify(self.service.soft_delete_task(TaskId::from_uuid(raw)).await)
                .map(|deleted| SoftDeleteOutcome { deleted }),
            Err(err) => Err(err),
        };
        log_failure("softDeleteTask", result)
    }

    /// Handles `getTask`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed identifier and
    /// `NotFound` for an unknown task.
    pub async fn get_task(&self, payload: TaskRefPayload) -> ApiResult<Task> {
        let result = match parse_uuid("taskId", &payload.task_id) {
            Ok(raw) => classify(self.service.get_task(TaskId::from_uuid(raw)).await),
            Err(err) => Err(err),
        };
        log_failure("getTask", result)
    }

    /// Handles `listTasks`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed identifier.
    pub async fn list_tasks(&self, payload: ListTasksPayload) -> ApiResult<Vec<Task>> {
        let result = match parse_uuid("batchId", &payload.batch_id) {
            Ok(raw) => classify(
                self.service
                    .list_tasks(BatchId::from_uuid(raw), payload.include_deleted)
                    .await,
            ),
            Err(err) => Err(err),
        };
        log_failure("listTasks", result)
    }
}
