//! Transition graphs restricting which statuses follow which.

use super::{TaskDomainError, TaskStatus};
use std::collections::{BTreeMap, BTreeSet};

/// Directed graph of permitted status changes.
///
/// A graph is opt-in: without one every vocabulary member is reachable from
/// every status. With one, only listed edges are permitted, including
/// self-edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionGraph {
    edges: BTreeMap<TaskStatus, BTreeSet<TaskStatus>>,
}

impl TransitionGraph {
    /// Creates a graph with no edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `from -> to`.
    #[must_use]
    pub fn allow(mut self, from: TaskStatus, to: TaskStatus) -> Self {
        self.edges.entry(from).or_default().insert(to);
        self
    }

    /// Builds a graph from an adjacency list of raw status names.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyStatus`] when any name is empty.
    pub fn from_adjacency<I, T>(adjacency: I) -> Result<Self, TaskDomainError>
    where
        I: IntoIterator<Item = (String, T)>,
        T: IntoIterator<Item = String>,
    {
        adjacency
            .into_iter()
            .try_fold(Self::new(), |graph, (from, targets)| {
                let source = TaskStatus::new(from)?;
                targets.into_iter().try_fold(graph, |acc, to| {
                    Ok(acc.allow(source.clone(), TaskStatus::new(to)?))
                })
            })
    }

    /// Returns `true` when `to` may follow `from`.
    #[must_use]
    pub fn is_reachable(&self, from: &TaskStatus, to: &TaskStatus) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Returns the statuses reachable from `from`.
    pub fn successors(&self, from: &TaskStatus) -> impl Iterator<Item = &TaskStatus> {
        self.edges.get(from).into_iter().flatten()
    }
}
