//! Workflow statuses and the per-batch status vocabulary.

use super::TaskDomainError;
use crate::organization::domain::BatchSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Trimmed, non-empty workflow status.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(String);

impl TaskStatus {
    /// Creates a validated status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyStatus`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyStatus);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskStatus {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statuses a batch's tasks may hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusVocabulary {
    /// Any non-empty status is allowed.
    #[default]
    Open,
    /// Only the listed statuses are allowed.
    Closed(BTreeSet<TaskStatus>),
}

impl StatusVocabulary {
    /// Builds a closed vocabulary from the given statuses.
    #[must_use]
    pub fn closed(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        Self::Closed(statuses.into_iter().collect())
    }

    /// Reads the vocabulary from `settings.workflow.statuses`.
    ///
    /// A missing `workflow` object or `statuses` key yields
    /// [`StatusVocabulary::Open`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MalformedWorkflowSettings`] when `statuses`
    /// is not an array of non-empty strings.
    pub fn from_batch_settings(settings: &BatchSettings) -> Result<Self, TaskDomainError> {
        let Some(statuses) = settings
            .get("workflow")
            .and_then(|workflow| workflow.get("statuses"))
        else {
            return Ok(Self::Open);
        };

        let Value::Array(entries) = statuses else {
            return Err(TaskDomainError::MalformedWorkflowSettings(
                "workflow.statuses must be an array".to_owned(),
            ));
        };

        entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .ok_or_else(|| {
                        TaskDomainError::MalformedWorkflowSettings(format!(
                            "status entry {entry} is not a string"
                        ))
                    })
                    .and_then(TaskStatus::new)
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self::Closed)
    }

    /// Returns `true` when the status is allowed.
    #[must_use]
    pub fn contains(&self, status: &TaskStatus) -> bool {
        match self {
            Self::Open => true,
            Self::Closed(statuses) => statuses.contains(status),
        }
    }

    /// Fails when the status is outside the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StatusNotInVocabulary`].
    pub fn ensure_allows(&self, status: &TaskStatus) -> Result<(), TaskDomainError> {
        if self.contains(status) {
            Ok(())
        } else {
            Err(TaskDomainError::StatusNotInVocabulary(status.clone()))
        }
    }
}
