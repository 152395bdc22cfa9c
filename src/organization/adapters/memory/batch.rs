//! In-memory batch repository.

use crate::organization::{
    domain::{Batch, BatchId, BatchPatch, ProjectId, RecordName},
    ports::BatchRepository,
};
use crate::store::{
    ConflictReason, EntityKind, MemoryDatabase, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;

/// Batch repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryBatchRepository {
    db: MemoryDatabase,
}

impl InMemoryBatchRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BatchRepository for InMemoryBatchRepository {
    async fn create(&self, batch: &Batch) -> RepositoryResult<()> {
        self.db.write(|tables| {
            if !tables.projects.contains_key(&batch.project_id()) {
                return Err(RepositoryError::conflict(
                    EntityKind::Batch,
                    ConflictReason::MissingReference(EntityKind::Project),
                ));
            }
            if tables.batches.contains_key(&batch.id()) {
                return Err(RepositoryError::duplicate(EntityKind::Batch, batch.id()));
            }
            if tables.batches.values().any(|existing| {
                existing.project_id() == batch.project_id() && existing.name() == batch.name()
            }) {
                return Err(RepositoryError::duplicate(EntityKind::Batch, batch.name()));
            }
            tables.batches.insert(batch.id(), batch.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: BatchId) -> RepositoryResult<Option<Batch>> {
        self.db.read(|tables| tables.batches.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        project_id: ProjectId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Batch>> {
        self.db.read(|tables| {
            tables
                .batches
                .values()
                .find(|batch| batch.project_id() == project_id && batch.name() == name)
                .cloned()
        })
    }

    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Batch>> {
        self.db.read(|tables| {
            let mut batches: Vec<Batch> = tables
                .batches
                .values()
                .filter(|batch| batch.project_id() == project_id)
                .cloned()
                .collect();
            batches.sort_by(|left, right| left.name().cmp(right.name()));
            batches
        })
    }

    async fn update_partial(&self, id: BatchId, patch: &BatchPatch) -> RepositoryResult<Batch> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Batch));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            let project_id = tables
                .batches
                .get(&id)
                .map(Batch::project_id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Batch, id))?;
            if let Some(name) = &patch.name
                && tables.batches.values().any(|other| {
                    other.id() != id && other.project_id() == project_id && other.name() == name
                })
            {
                return Err(RepositoryError::duplicate(EntityKind::Batch, name));
            }
            let batch = tables
                .batches
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Batch, id))?;
            batch.apply_patch(patch, at);
            Ok(batch.clone())
        })
    }

    async fn delete(&self, id: BatchId) -> RepositoryResult<bool> {
        self.db.write(|tables| {
            if !tables.batches.contains_key(&id) {
                return Ok(false);
            }
            if tables.tasks.values().any(|task| task.batch_id() == id) {
                return Err(RepositoryError::conflict(
                    EntityKind::Batch,
                    ConflictReason::HasDependents(EntityKind::Task),
                ));
            }
            tables.batches.remove(&id);
            Ok(true)
        })
    }
}
