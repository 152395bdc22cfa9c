//! Domain model for the task workflow.
//!
//! Statuses are free-form strings constrained per batch by an optional
//! vocabulary and, optionally, by a transition graph. Every status change is
//! recorded as an immutable [`TaskTransition`]; [`verify_ledger`] checks that
//! the recorded history agrees with the task it belongs to.

mod error;
mod graph;
mod ids;
mod ledger;
mod status;
mod task;
mod transition;

pub use error::TaskDomainError;
pub use graph::TransitionGraph;
pub use ids::{TaskId, TransitionId};
pub use ledger::{LedgerViolation, verify_ledger};
pub use status::{StatusVocabulary, TaskStatus};
pub use task::{CreateTaskRequest, PersistedTaskData, Task, TaskName};
pub use transition::{
    NewTaskTransition, PersistedTransitionData, TaskTransition, TransitionPlan, TransitionRequest,
};
