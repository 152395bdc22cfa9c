//! `PostgreSQL` repository for tasks and their ledger.

use super::models::{NewTransitionRow, TaskRow, TransitionRow};
use crate::identity::domain::UserId;
use crate::organization::domain::{BatchId, BatchSettings, BatchStatus};
use crate::store::postgres::{
    PgPool, read_error, run_blocking, run_in_transaction,
    schema::{batches, task_transitions, tasks},
    translate_write_error,
};
use crate::store::{ConflictReason, EntityKind, RepositoryError};
use crate::task::{
    domain::{
        NewTaskTransition, PersistedTaskData, PersistedTransitionData, StatusVocabulary, Task,
        TaskId, TaskName, TaskStatus, TaskTransition, TransitionId, TransitionPlan,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;

/// `PostgreSQL`-backed task repository.
///
/// Status changes share-lock the batch and then lock the task row with
/// `SELECT ... FOR UPDATE`, so concurrent transitions on one task queue
/// behind each other and each one observes the status committed by its
/// predecessor.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create_with_initial_transition(
        &self,
        task: &Task,
        initial: &NewTaskTransition,
    ) -> TaskRepositoryResult<TaskTransition> {
        let task_row = task_to_row(task);
        let transition_row = to_new_transition_row(initial);
        let initial_status = task.current_status().clone();
        run_in_transaction(&self.pool, EntityKind::Task, move |connection| {
            let (status, settings) = lock_batch(connection, BatchId::from_uuid(task_row.batch_id))?
                .ok_or_else(|| {
                    RepositoryError::conflict(
                        EntityKind::Task,
                        ConflictReason::MissingReference(EntityKind::Batch),
                    )
                })?;
            if status.is_archived() {
                return Err(TaskRepositoryError::from(RepositoryError::conflict(
                    EntityKind::Task,
                    ConflictReason::Archived,
                )));
            }
            StatusVocabulary::from_batch_settings(&settings)?.ensure_allows(&initial_status)?;

            diesel::insert_into(tasks::table)
                .values(&task_row)
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Task))?;
            insert_transition(connection, &transition_row)
        })
        .await
    }

    async fn apply_transition(
        &self,
        plan: &TransitionPlan,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<(Task, TaskTransition)> {
        let locked_plan = plan.clone();
        run_in_transaction(&self.pool, EntityKind::Task, move |connection| {
            let task_id = locked_plan.request().task_id();
            let batch_id = batch_of_task(connection, task_id)?;
            let (_, settings) = lock_batch(connection, batch_id)?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Batch, batch_id))?;
            let mut task = lock_task(connection, task_id)?;
            let entry = locked_plan.apply(&mut task, &settings, at)?;

            diesel::update(tasks::table.find(task_id.into_inner()))
                .set((
                    tasks::current_status.eq(task.current_status().as_str()),
                    tasks::current_owner.eq(task.current_owner().map(UserId::into_inner)),
                    tasks::updated_at.eq(task.updated_at()),
                ))
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Task))?;
            let transition = insert_transition(connection, &to_new_transition_row(&entry))?;
            Ok((task, transition))
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        run_blocking(&self.pool, move |connection| {
            tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn list_for_batch(
        &self,
        batch_id: BatchId,
        include_deleted: bool,
    ) -> TaskRepositoryResult<Vec<Task>> {
        run_blocking(&self.pool, move |connection| {
            let mut query = tasks::table
                .filter(tasks::batch_id.eq(batch_id.into_inner()))
                .into_boxed();
            if !include_deleted {
                query = query.filter(tasks::is_deleted.eq(false));
            }
            query
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn reassign_owner(
        &self,
        id: TaskId,
        owner: Option<UserId>,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        run_in_transaction(&self.pool, EntityKind::Task, move |connection| {
            let mut task = lock_task(connection, id)?;
            task.reassign(owner, at)?;
            diesel::update(tasks::table.find(id.into_inner()))
                .set((
                    tasks::current_owner.eq(owner.map(UserId::into_inner)),
                    tasks::updated_at.eq(at),
                ))
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Task))?;
            Ok(task)
        })
        .await
    }

    async fn soft_delete(&self, id: TaskId, at: DateTime<Utc>) -> TaskRepositoryResult<bool> {
        run_in_transaction(&self.pool, EntityKind::Task, move |connection| {
            let mut task = lock_task(connection, id)?;
            if !task.mark_deleted(at) {
                return Ok(false);
            }
            diesel::update(tasks::table.find(id.into_inner()))
                .set((tasks::is_deleted.eq(true), tasks::updated_at.eq(at)))
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Task))?;
            Ok(true)
        })
        .await
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskTransition>> {
        run_blocking(&self.pool, move |connection| {
            let exists = diesel::select(diesel::dsl::exists(tasks::table.find(id.into_inner())))
                .get_result::<bool>(connection)
                .map_err(read_error)?;
            if !exists {
                return Err(TaskRepositoryError::from(RepositoryError::not_found(
                    EntityKind::Task,
                    id,
                )));
            }
            task_transitions::table
                .filter(task_transitions::task_id.eq(id.into_inner()))
                .order(task_transitions::id.asc())
                .select(TransitionRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_transition)
                .collect()
        })
        .await
    }
}

/// Reads the batch a task belongs to without locking the task.
///
/// A task never changes batch, so the batch can be locked before the task.
/// Batch deletes take the locks in that same order.
fn batch_of_task(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<BatchId> {
    tasks::table
        .find(id.into_inner())
        .select(tasks::batch_id)
        .first::<uuid::Uuid>(connection)
        .optional()
        .map_err(read_error)?
        .map(BatchId::from_uuid)
        .ok_or_else(|| TaskRepositoryError::from(RepositoryError::not_found(EntityKind::Task, id)))
}

/// Reads and locks the task row for the rest of the transaction.
fn lock_task(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<Task> {
    tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .for_update()
        .first(connection)
        .optional()
        .map_err(read_error)?
        .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, id))
        .map_err(TaskRepositoryError::from)
        .and_then(row_to_task)
}

/// Reads the batch status and settings, blocking concurrent batch updates.
fn lock_batch(
    connection: &mut PgConnection,
    id: BatchId,
) -> TaskRepositoryResult<Option<(BatchStatus, BatchSettings)>> {
    let Some((status, settings)) = batches::table
        .find(id.into_inner())
        .select((batches::status, batches::settings))
        .for_share()
        .first::<(String, Value)>(connection)
        .optional()
        .map_err(read_error)?
    else {
        return Ok(None);
    };
    let batch_status =
        BatchStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let batch_settings = BatchSettings::new(settings).map_err(TaskRepositoryError::persistence)?;
    Ok(Some((batch_status, batch_settings)))
}

fn insert_transition(
    connection: &mut PgConnection,
    row: &NewTransitionRow,
) -> TaskRepositoryResult<TaskTransition> {
    diesel::insert_into(task_transitions::table)
        .values(row)
        .returning(TransitionRow::as_returning())
        .get_result(connection)
        .map_err(|err| translate_write_error(err, EntityKind::TaskTransition))
        .map_err(TaskRepositoryError::from)
        .and_then(row_to_transition)
}

fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        batch_id: task.batch_id().into_inner(),
        name: task.name().as_str().to_owned(),
        is_deleted: task.is_deleted(),
        current_status: task.current_status().as_str().to_owned(),
        current_owner: task.current_owner().map(UserId::into_inner),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn to_new_transition_row(entry: &NewTaskTransition) -> NewTransitionRow {
    NewTransitionRow {
        task_id: entry.task_id().into_inner(),
        actor_id: entry.actor_id().map(UserId::into_inner),
        from_status: entry.from_status().map(|status| status.as_str().to_owned()),
        to_status: entry.to_status().as_str().to_owned(),
        owner: entry.owner().map(UserId::into_inner),
        created_at: entry.created_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        batch_id,
        name,
        is_deleted,
        current_status,
        current_owner,
        created_at,
        updated_at,
    } = row;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        batch_id: BatchId::from_uuid(batch_id),
        name: TaskName::new(name).map_err(TaskRepositoryError::persistence)?,
        is_deleted,
        current_status: TaskStatus::new(current_status)
            .map_err(TaskRepositoryError::persistence)?,
        current_owner: current_owner.map(UserId::from_uuid),
        created_at,
        updated_at,
    }))
}

fn row_to_transition(row: TransitionRow) -> TaskRepositoryResult<TaskTransition> {
    let TransitionRow {
        id,
        task_id,
        actor_id,
        from_status,
        to_status,
        owner,
        created_at,
    } = row;
    Ok(TaskTransition::from_persisted(PersistedTransitionData {
        id: TransitionId::new(id),
        task_id: TaskId::from_uuid(task_id),
        actor_id: actor_id.map(UserId::from_uuid),
        from_status: from_status
            .map(TaskStatus::new)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        to_status: TaskStatus::new(to_status).map_err(TaskRepositoryError::persistence)?,
        owner: owner.map(UserId::from_uuid),
        created_at,
    }))
}
