//! Identifier types for the task domain.

use crate::ids::{serial_identifier, uuid_identifier};

uuid_identifier! {
    /// Unique identifier for a task.
    TaskId
}

serial_identifier! {
    /// Store-assigned, monotonically increasing ledger entry identifier.
    ///
    /// Ordering by this identifier is ordering by creation sequence.
    TransitionId
}
