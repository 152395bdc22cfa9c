//! Diesel row models for tasks and ledger entries.

use crate::store::postgres::schema::{task_transitions, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Task row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning batch.
    pub batch_id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Current workflow status.
    pub current_status: String,
    /// Current owner.
    pub current_owner: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry as read back from the table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_transitions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransitionRow {
    /// Sequence identifier.
    pub id: i64,
    /// Task the entry belongs to.
    pub task_id: uuid::Uuid,
    /// Acting user.
    pub actor_id: Option<uuid::Uuid>,
    /// Status before the change.
    pub from_status: Option<String>,
    /// Status after the change.
    pub to_status: String,
    /// Owner after the change.
    pub owner: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for ledger entries; the sequence assigns `id`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_transitions)]
pub struct NewTransitionRow {
    /// Task the entry belongs to.
    pub task_id: uuid::Uuid,
    /// Acting user.
    pub actor_id: Option<uuid::Uuid>,
    /// Status before the change.
    pub from_status: Option<String>,
    /// Status after the change.
    pub to_status: String,
    /// Owner after the change.
    pub owner: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
