//! Error types for task workflow rules.

use super::{TaskId, TaskStatus};
use crate::error::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Errors raised while validating or applying workflow rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The task name exceeds the column width.
    #[error("task name '{0}' exceeds 255 characters")]
    TaskNameTooLong(String),

    /// A status value is empty after trimming.
    #[error("status must not be empty")]
    EmptyStatus,

    /// The batch's `workflow.statuses` setting is not an array of strings.
    #[error("batch workflow settings are malformed: {0}")]
    MalformedWorkflowSettings(String),

    /// The status is not part of the batch vocabulary.
    #[error("status '{0}' is not allowed by the batch workflow")]
    StatusNotInVocabulary(TaskStatus),

    /// The transition graph has no edge between the two statuses.
    #[error("status '{to}' is not reachable from '{from}'")]
    UnreachableStatus {
        /// Status held before the attempted transition.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },

    /// The task is soft-deleted and no longer accepts changes.
    #[error("task {0} is deleted")]
    TaskDeleted(TaskId),

    /// The caller assumed a status that the task no longer has.
    #[error("expected status '{expected}' but task is '{actual}'")]
    StaleStatus {
        /// Status the caller assumed.
        expected: TaskStatus,
        /// Status observed under lock.
        actual: TaskStatus,
    },
}

impl ClassifiedError for TaskDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTaskName
            | Self::TaskNameTooLong(_)
            | Self::EmptyStatus
            | Self::MalformedWorkflowSettings(_) => ErrorKind::Validation,
            Self::StatusNotInVocabulary(_) | Self::UnreachableStatus { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::TaskDeleted(_) => ErrorKind::NotFound,
            Self::StaleStatus { .. } => ErrorKind::Conflict,
        }
    }
}
