//! In-memory project repository.

use crate::organization::{
    domain::{OrganizationId, Project, ProjectId, ProjectPatch, ProjectStatus, RecordName},
    ports::ProjectRepository,
};
use crate::store::{
    ConflictReason, EntityKind, MemoryDatabase, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;

/// Project repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    db: MemoryDatabase,
}

impl InMemoryProjectRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }

    fn projects_where(
        &self,
        predicate: impl Fn(&Project) -> bool,
    ) -> RepositoryResult<Vec<Project>> {
        self.db.read(|tables| {
            let mut projects: Vec<Project> = tables
                .projects
                .values()
                .filter(|project| predicate(*project))
                .cloned()
                .collect();
            projects.sort_by(|left, right| left.name().cmp(right.name()));
            projects
        })
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(&self, project: &Project) -> RepositoryResult<()> {
        self.db.write(|tables| {
            if !tables
                .organizations
                .contains_key(&project.organization_id())
            {
                return Err(RepositoryError::conflict(
                    EntityKind::Project,
                    ConflictReason::MissingReference(EntityKind::Organization),
                ));
            }
            if tables.projects.contains_key(&project.id()) {
                return Err(RepositoryError::duplicate(EntityKind::Project, project.id()));
            }
            if tables.projects.values().any(|existing| {
                existing.organization_id() == project.organization_id()
                    && existing.name() == project.name()
            }) {
                return Err(RepositoryError::duplicate(
                    EntityKind::Project,
                    project.name(),
                ));
            }
            tables.projects.insert(project.id(), project.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        self.db.read(|tables| tables.projects.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        organization_id: OrganizationId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Project>> {
        self.db.read(|tables| {
            tables
                .projects
                .values()
                .find(|project| {
                    project.organization_id() == organization_id && project.name() == name
                })
                .cloned()
        })
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<Project>> {
        self.projects_where(|project| project.organization_id() == organization_id)
    }

    async fn list_active(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<Project>> {
        self.projects_where(|project| {
            project.organization_id() == organization_id
                && project.status() == ProjectStatus::Active
        })
    }

    async fn update_partial(
        &self,
        id: ProjectId,
        patch: &ProjectPatch,
    ) -> RepositoryResult<Project> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Project));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            let organization_id = tables
                .projects
                .get(&id)
                .map(Project::organization_id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Project, id))?;
            if let Some(name) = &patch.name
                && tables.projects.values().any(|other| {
                    other.id() != id
                        && other.organization_id() == organization_id
                        && other.name() == name
                })
            {
                return Err(RepositoryError::duplicate(EntityKind::Project, name));
            }
            let project = tables
                .projects
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Project, id))?;
            project.apply_patch(patch, at);
            Ok(project.clone())
        })
    }

    async fn archive(&self, id: ProjectId) -> RepositoryResult<Project> {
        let patch = ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..ProjectPatch::default()
        };
        self.update_partial(id, &patch).await
    }

    async fn delete(&self, id: ProjectId) -> RepositoryResult<bool> {
        self.db.write(|tables| {
            if !tables.projects.contains_key(&id) {
                return Ok(false);
            }
            if tables.batches.values().any(|batch| batch.project_id() == id) {
                return Err(RepositoryError::conflict(
                    EntityKind::Project,
                    ConflictReason::HasDependents(EntityKind::Batch),
                ));
            }
            tables.projects.remove(&id);
            Ok(true)
        })
    }
}
