//! In-memory repository for tasks and their ledger.

use crate::identity::domain::UserId;
use crate::organization::domain::{BatchId, BatchSettings};
use crate::store::memory::MemoryTables;
use crate::store::{ConflictReason, EntityKind, MemoryDatabase, RepositoryError};
use crate::task::{
    domain::{NewTaskTransition, StatusVocabulary, Task, TaskId, TaskTransition, TransitionPlan},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Task repository backed by a [`MemoryDatabase`].
///
/// Each mutation runs in one [`MemoryDatabase::transaction`], so the task row
/// and its ledger entry are published together and concurrent transitions
/// on the same task are serialized.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    db: MemoryDatabase,
}

impl InMemoryTaskRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }
}

fn ensure_user(
    tables: &MemoryTables,
    user: Option<UserId>,
    referencing: EntityKind,
) -> Result<(), RepositoryError> {
    match user {
        Some(id) if !tables.users.contains_key(&id) => Err(RepositoryError::conflict(
            referencing,
            ConflictReason::MissingReference(EntityKind::User),
        )),
        _ => Ok(()),
    }
}

fn batch_settings(tables: &MemoryTables, batch_id: BatchId) -> Result<BatchSettings, RepositoryError> {
    tables
        .batches
        .get(&batch_id)
        .map(|batch| batch.settings().clone())
        .ok_or_else(|| RepositoryError::not_found(EntityKind::Batch, batch_id))
}

fn append(tables: &mut MemoryTables, entry: NewTaskTransition) -> TaskTransition {
    let id = tables.next_transition_id();
    let transition = entry.into_transition(id);
    tables.transitions.insert(id, transition.clone());
    transition
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create_with_initial_transition(
        &self,
        task: &Task,
        initial: &NewTaskTransition,
    ) -> TaskRepositoryResult<TaskTransition> {
        self.db.transaction::<_, TaskRepositoryError, _>(|tables| {
            let batch = tables.batches.get(&task.batch_id()).ok_or_else(|| {
                RepositoryError::conflict(
                    EntityKind::Task,
                    ConflictReason::MissingReference(EntityKind::Batch),
                )
            })?;
            if batch.status().is_archived() {
                return Err(TaskRepositoryError::from(RepositoryError::conflict(
                    EntityKind::Task,
                    ConflictReason::Archived,
                )));
            }
            StatusVocabulary::from_batch_settings(batch.settings())?
                .ensure_allows(task.current_status())?;
            if tables.tasks.contains_key(&task.id()) {
                return Err(TaskRepositoryError::from(RepositoryError::duplicate(
                    EntityKind::Task,
                    task.id(),
                )));
            }
            ensure_user(tables, task.current_owner(), EntityKind::Task)?;
            ensure_user(tables, initial.actor_id(), EntityKind::TaskTransition)?;

            tables.tasks.insert(task.id(), task.clone());
            Ok(append(tables, initial.clone()))
        })
    }

    async fn apply_transition(
        &self,
        plan: &TransitionPlan,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<(Task, TaskTransition)> {
        let task_id = plan.request().task_id();
        self.db.transaction::<_, TaskRepositoryError, _>(|tables| {
            let mut task = tables
                .tasks
                .get(&task_id)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, task_id))?;
            let settings = batch_settings(tables, task.batch_id())?;
            let entry = plan.apply(&mut task, &settings, at)?;
            ensure_user(tables, plan.request().owner(), EntityKind::Task)?;
            ensure_user(tables, entry.actor_id(), EntityKind::TaskTransition)?;

            tables.tasks.insert(task_id, task.clone());
            let transition = append(tables, entry);
            Ok((task, transition))
        })
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.db.read(|tables| tables.tasks.get(&id).cloned())?)
    }

    async fn list_for_batch(
        &self,
        batch_id: BatchId,
        include_deleted: bool,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.db.read(|tables| {
            let mut tasks: Vec<Task> = tables
                .tasks
                .values()
                .filter(|task| task.batch_id() == batch_id)
                .filter(|task| include_deleted || !task.is_deleted())
                .cloned()
                .collect();
            tasks.sort_by_key(|task| (task.created_at(), task.id()));
            tasks
        })?;
        Ok(tasks)
    }

    async fn reassign_owner(
        &self,
        id: TaskId,
        owner: Option<UserId>,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        self.db.transaction::<_, TaskRepositoryError, _>(|tables| {
            let mut task = tables
                .tasks
                .get(&id)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, id))?;
            task.reassign(owner, at)?;
            ensure_user(tables, owner, EntityKind::Task)?;
            tables.tasks.insert(id, task.clone());
            Ok(task)
        })
    }

    async fn soft_delete(&self, id: TaskId, at: DateTime<Utc>) -> TaskRepositoryResult<bool> {
        self.db.transaction::<_, TaskRepositoryError, _>(|tables| {
            let task = tables
                .tasks
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, id))?;
            Ok(task.mark_deleted(at))
        })
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskTransition>> {
        let history = self.db.read(|tables| {
            tables.tasks.contains_key(&id).then(|| {
                tables
                    .transitions
                    .values()
                    .filter(|transition| transition.task_id() == id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })?;
        history.ok_or_else(|| RepositoryError::not_found(EntityKind::Task, id).into())
    }
}
