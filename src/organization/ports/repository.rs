//! Repository ports for organizations, projects and batches.

use crate::organization::domain::{
    Batch, BatchId, BatchPatch, Organization, OrganizationId, OrganizationPatch, Project,
    ProjectId, ProjectPatch, RecordName,
};
use crate::store::RepositoryResult;
use async_trait::async_trait;

/// Organization persistence contract.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Stores a new organization.
    ///
    /// # Errors
    ///
    /// Returns [`crate::store::RepositoryError::Conflict`] when the name is
    /// already taken.
    async fn create(&self, organization: &Organization) -> RepositoryResult<()>;

    /// Finds an organization by identifier.
    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>>;

    /// Finds an organization by its unique name.
    async fn find_by_name(&self, name: &RecordName) -> RepositoryResult<Option<Organization>>;

    /// Returns every organization.
    async fn list_all(&self) -> RepositoryResult<Vec<Organization>>;

    /// Returns organizations whose active flag is set.
    async fn list_active(&self) -> RepositoryResult<Vec<Organization>>;

    /// Applies a partial update and returns the updated organization.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch, `NotFound` when the
    /// organization does not exist and `Conflict` when the new name is taken.
    async fn update_partial(
        &self,
        id: OrganizationId,
        patch: &OrganizationPatch,
    ) -> RepositoryResult<Organization>;

    /// Sets the active flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the organization does not exist.
    async fn set_active(&self, id: OrganizationId, active: bool)
    -> RepositoryResult<Organization>;

    /// Marks the organization active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the organization does not exist.
    async fn activate(&self, id: OrganizationId) -> RepositoryResult<Organization> {
        self.set_active(id, true).await
    }

    /// Marks the organization inactive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the organization does not exist.
    async fn deactivate(&self, id: OrganizationId) -> RepositoryResult<Organization> {
        self.set_active(id, false).await
    }

    /// Marks the organization inactive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the organization does not exist.
    async fn soft_delete(&self, id: OrganizationId) -> RepositoryResult<()>;

    /// Marks every listed organization inactive, returning how many rows
    /// matched.
    async fn bulk_deactivate(&self, ids: &[OrganizationId]) -> RepositoryResult<u64>;

    /// Permanently removes an organization without projects.
    ///
    /// Returns `false` when the organization did not exist.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` while projects still reference the organization.
    async fn delete(&self, id: OrganizationId) -> RepositoryResult<bool>;
}

/// Project persistence contract.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the organization does not exist or the name is
    /// already used within it.
    async fn create(&self, project: &Project) -> RepositoryResult<()>;

    /// Finds a project by identifier.
    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>>;

    /// Finds a project by name within an organization.
    async fn find_by_name(
        &self,
        organization_id: OrganizationId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Project>>;

    /// Returns every project of an organization.
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<Project>>;

    /// Returns the organization's projects with `Active` status.
    async fn list_active(&self, organization_id: OrganizationId)
    -> RepositoryResult<Vec<Project>>;

    /// Applies a partial update and returns the updated project.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch, `NotFound` when the project
    /// does not exist and `Conflict` when the new name is taken.
    async fn update_partial(&self, id: ProjectId, patch: &ProjectPatch)
    -> RepositoryResult<Project>;

    /// Moves the project to `Archived`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the project does not exist.
    async fn archive(&self, id: ProjectId) -> RepositoryResult<Project>;

    /// Permanently removes a project without batches.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` while batches still reference the project.
    async fn delete(&self, id: ProjectId) -> RepositoryResult<bool>;
}

/// Batch persistence contract.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Stores a new batch.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the project does not exist or the name is
    /// already used within it.
    async fn create(&self, batch: &Batch) -> RepositoryResult<()>;

    /// Finds a batch by identifier.
    async fn find_by_id(&self, id: BatchId) -> RepositoryResult<Option<Batch>>;

    /// Finds a batch by name within a project.
    async fn find_by_name(
        &self,
        project_id: ProjectId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Batch>>;

    /// Returns every batch of a project.
    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Batch>>;

    /// Applies a partial update and returns the updated batch.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch, `NotFound` when the batch
    /// does not exist and `Conflict` when the new name is taken.
    async fn update_partial(&self, id: BatchId, patch: &BatchPatch) -> RepositoryResult<Batch>;

    /// Permanently removes a batch without tasks.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` while tasks (including soft-deleted ones) still
    /// reference the batch.
    async fn delete(&self, id: BatchId) -> RepositoryResult<bool>;
}
