//! Consistency checks over a task's transition ledger.

use super::{Task, TaskStatus, TaskTransition, TransitionId};
use thiserror::Error;

/// A broken ledger invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerViolation {
    /// The task has no ledger entries at all.
    #[error("ledger is empty")]
    Empty,

    /// The first entry is not an initial entry.
    #[error("first entry {0} has a from_status")]
    MissingInitialEntry(TransitionId),

    /// An initial entry appears after the first position.
    #[error("entry {0} is a second initial entry")]
    RepeatedInitialEntry(TransitionId),

    /// Entries are not in strictly increasing sequence order.
    #[error("entry {later} does not follow {earlier}")]
    OutOfOrder {
        /// Preceding entry.
        earlier: TransitionId,
        /// Entry that should come after it.
        later: TransitionId,
    },

    /// An entry belongs to a different task.
    #[error("entry {0} belongs to another task")]
    ForeignEntry(TransitionId),

    /// An entry does not start where its predecessor ended.
    #[error("entry {id} starts at '{found}' but the previous entry ended at '{expected}'")]
    BrokenChain {
        /// Entry whose `from_status` is wrong.
        id: TransitionId,
        /// `to_status` of the predecessor.
        expected: TaskStatus,
        /// `from_status` actually recorded.
        found: TaskStatus,
    },

    /// The task's status disagrees with the latest entry.
    #[error("task is '{task_status}' but the latest entry ends at '{ledger_status}'")]
    StatusMismatch {
        /// Status held by the task.
        task_status: TaskStatus,
        /// `to_status` of the latest entry.
        ledger_status: TaskStatus,
    },
}

/// Checks that `history` is a faithful ledger for `task`.
///
/// The history must be ordered by sequence, start with exactly one initial
/// entry, chain each `from_status` to the previous `to_status` and end at the
/// task's current status.
///
/// # Errors
///
/// Returns the first [`LedgerViolation`] found.
pub fn verify_ledger(history: &[TaskTransition], task: &Task) -> Result<(), LedgerViolation> {
    let Some((first, rest)) = history.split_first() else {
        return Err(LedgerViolation::Empty);
    };
    if !first.is_initial() {
        return Err(LedgerViolation::MissingInitialEntry(first.id()));
    }

    let mut previous = first;
    for entry in history {
        if entry.task_id() != task.id() {
            return Err(LedgerViolation::ForeignEntry(entry.id()));
        }
    }
    for entry in rest {
        if entry.id() <= previous.id() {
            return Err(LedgerViolation::OutOfOrder {
                earlier: previous.id(),
                later: entry.id(),
            });
        }
        let Some(from) = entry.from_status() else {
            return Err(LedgerViolation::RepeatedInitialEntry(entry.id()));
        };
        if from != previous.to_status() {
            return Err(LedgerViolation::BrokenChain {
                id: entry.id(),
                expected: previous.to_status().clone(),
                found: from.clone(),
            });
        }
        previous = entry;
    }

    if previous.to_status() != task.current_status() {
        return Err(LedgerViolation::StatusMismatch {
            task_status: task.current_status().clone(),
            ledger_status: previous.to_status().clone(),
        });
    }
    Ok(())
}
