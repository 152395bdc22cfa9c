//! `PostgreSQL` repositories for organizations, projects and batches.

use super::models::{
    BatchChangeset, BatchRow, OrganizationChangeset, OrganizationRow, ProjectChangeset,
    ProjectRow,
};
use crate::organization::{
    domain::{
        Batch, BatchId, BatchPatch, BatchSettings, BatchStatus, Organization, OrganizationId,
        OrganizationKind, OrganizationPatch, PersistedBatchData, PersistedOrganizationData,
        PersistedProjectData, Project, ProjectId, ProjectKind, ProjectPatch, ProjectStatus,
        RecordName,
    },
    ports::{BatchRepository, OrganizationRepository, ProjectRepository},
};
use crate::store::postgres::{
    PgPool, read_error, run_blocking, run_in_transaction,
    schema::{batches, organizations, projects},
    translate_delete_error, translate_write_error,
};
use crate::store::{EntityKind, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;

/// `PostgreSQL`-backed organization repository.
#[derive(Debug, Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `PostgreSQL`-backed batch repository.
#[derive(Debug, Clone)]
pub struct PostgresBatchRepository {
    pool: PgPool,
}

impl PostgresBatchRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn create(&self, organization: &Organization) -> RepositoryResult<()> {
        let row = organization_to_row(organization);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(organizations::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Organization))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>> {
        run_blocking(&self.pool, move |connection| {
            organizations::table
                .find(id.into_inner())
                .select(OrganizationRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_organization)
                .transpose()
        })
        .await
    }

    async fn find_by_name(&self, name: &RecordName) -> RepositoryResult<Option<Organization>> {
        let lookup = name.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            organizations::table
                .filter(organizations::name.eq(lookup))
                .select(OrganizationRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_organization)
                .transpose()
        })
        .await
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Organization>> {
        run_blocking(&self.pool, move |connection| {
            organizations::table
                .order(organizations::name.asc())
                .select(OrganizationRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_organization)
                .collect()
        })
        .await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Organization>> {
        run_blocking(&self.pool, move |connection| {
            organizations::table
                .filter(organizations::is_active.eq(true))
                .order(organizations::name.asc())
                .select(OrganizationRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_organization)
                .collect()
        })
        .await
    }

    async fn update_partial(
        &self,
        id: OrganizationId,
        patch: &OrganizationPatch,
    ) -> RepositoryResult<Organization> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Organization));
        }
        let changeset = OrganizationChangeset {
            name: patch.name.as_ref().map(|name| name.as_str().to_owned()),
            kind: patch.kind.map(|kind| kind.as_str().to_owned()),
            is_active: patch.is_active,
        };
        run_in_transaction(&self.pool, EntityKind::Organization, move |connection| {
            diesel::update(organizations::table.find(id.into_inner()))
                .set((&changeset, organizations::updated_at.eq(now)))
                .returning(OrganizationRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::Organization))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Organization, id))
                .and_then(row_to_organization)
        })
        .await
    }

    async fn set_active(
        &self,
        id: OrganizationId,
        active: bool,
    ) -> RepositoryResult<Organization> {
        let patch = OrganizationPatch {
            is_active: Some(active),
            ..OrganizationPatch::default()
        };
        self.update_partial(id, &patch).await
    }

    async fn soft_delete(&self, id: OrganizationId) -> RepositoryResult<()> {
        self.set_active(id, false).await.map(|_| ())
    }

    async fn bulk_deactivate(&self, ids: &[OrganizationId]) -> RepositoryResult<u64> {
        let targets: Vec<uuid::Uuid> = ids.iter().copied().map(OrganizationId::into_inner).collect();
        run_in_transaction(&self.pool, EntityKind::Organization, move |connection| {
            let matched = diesel::update(
                organizations::table.filter(organizations::id.eq_any(targets)),
            )
            .set((
                organizations::is_active.eq(false),
                organizations::updated_at.eq(now),
            ))
            .execute(connection)
            .map_err(|err| translate_write_error(err, EntityKind::Organization))?;
            u64::try_from(matched).map_err(RepositoryError::persistence)
        })
        .await
    }

    async fn delete(&self, id: OrganizationId) -> RepositoryResult<bool> {
        run_in_transaction(&self.pool, EntityKind::Organization, move |connection| {
            let removed = diesel::delete(organizations::table.find(id.into_inner()))
                .execute(connection)
                .map_err(|err| translate_delete_error(err, EntityKind::Organization))?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn create(&self, project: &Project) -> RepositoryResult<()> {
        let row = project_to_row(project);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Project))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        run_blocking(&self.pool, move |connection| {
            projects::table
                .find(id.into_inner())
                .select(ProjectRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_project)
                .transpose()
        })
        .await
    }

    async fn find_by_name(
        &self,
        organization_id: OrganizationId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Project>> {
        let lookup = name.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            projects::table
                .filter(projects::organization_id.eq(organization_id.into_inner()))
                .filter(projects::name.eq(lookup))
                .select(ProjectRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_project)
                .transpose()
        })
        .await
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<Project>> {
        run_blocking(&self.pool, move |connection| {
            projects::table
                .filter(projects::organization_id.eq(organization_id.into_inner()))
                .order(projects::name.asc())
                .select(ProjectRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_project)
                .collect()
        })
        .await
    }

    async fn list_active(
        &self,
        organization_id: OrganizationId,
    ) -> RepositoryResult<Vec<Project>> {
        run_blocking(&self.pool, move |connection| {
            projects::table
                .filter(projects::organization_id.eq(organization_id.into_inner()))
                .filter(projects::status.eq(ProjectStatus::Active.as_str()))
                .order(projects::name.asc())
                .select(ProjectRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_project)
                .collect()
        })
        .await
    }

    async fn update_partial(
        &self,
        id: ProjectId,
        patch: &ProjectPatch,
    ) -> RepositoryResult<Project> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Project));
        }
        let changeset = ProjectChangeset {
            name: patch.name.as_ref().map(|name| name.as_str().to_owned()),
            kind: patch.kind.as_ref().map(|kind| kind.as_str().to_owned()),
            status: patch.status.map(|status| status.as_str().to_owned()),
            metadata: patch.metadata.clone(),
        };
        run_in_transaction(&self.pool, EntityKind::Project, move |connection| {
            diesel::update(projects::table.find(id.into_inner()))
                .set((&changeset, projects::updated_at.eq(now)))
                .returning(ProjectRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::Project))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Project, id))
                .and_then(row_to_project)
        })
        .await
    }

    async fn archive(&self, id: ProjectId) -> RepositoryResult<Project> {
        let patch = ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..ProjectPatch::default()
        };
        self.update_partial(id, &patch).await
    }

    async fn delete(&self, id: ProjectId) -> RepositoryResult<bool> {
        run_in_transaction(&self.pool, EntityKind::Project, move |connection| {
            let removed = diesel::delete(projects::table.find(id.into_inner()))
                .execute(connection)
                .map_err(|err| translate_delete_error(err, EntityKind::Project))?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl BatchRepository for PostgresBatchRepository {
    async fn create(&self, batch: &Batch) -> RepositoryResult<()> {
        let row = batch_to_row(batch);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(batches::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Batch))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: BatchId) -> RepositoryResult<Option<Batch>> {
        run_blocking(&self.pool, move |connection| {
            batches::table
                .find(id.into_inner())
                .select(BatchRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_batch)
                .transpose()
        })
        .await
    }

    async fn find_by_name(
        &self,
        project_id: ProjectId,
        name: &RecordName,
    ) -> RepositoryResult<Option<Batch>> {
        let lookup = name.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            batches::table
                .filter(batches::project_id.eq(project_id.into_inner()))
                .filter(batches::name.eq(lookup))
                .select(BatchRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_batch)
                .transpose()
        })
        .await
    }

    async fn list_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Batch>> {
        run_blocking(&self.pool, move |connection| {
            batches::table
                .filter(batches::project_id.eq(project_id.into_inner()))
                .order(batches::name.asc())
                .select(BatchRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_batch)
                .collect()
        })
        .await
    }

    async fn update_partial(&self, id: BatchId, patch: &BatchPatch) -> RepositoryResult<Batch> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Batch));
        }
        let changeset = BatchChangeset {
            name: patch.name.as_ref().map(|name| name.as_str().to_owned()),
            status: patch.status.map(|status| status.as_str().to_owned()),
            settings: patch
                .settings
                .as_ref()
                .map(|settings| settings.as_value().clone()),
        };
        run_in_transaction(&self.pool, EntityKind::Batch, move |connection| {
            diesel::update(batches::table.find(id.into_inner()))
                .set((&changeset, batches::updated_at.eq(now)))
                .returning(BatchRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::Batch))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Batch, id))
                .and_then(row_to_batch)
        })
        .await
    }

    async fn delete(&self, id: BatchId) -> RepositoryResult<bool> {
        run_in_transaction(&self.pool, EntityKind::Batch, move |connection| {
            let removed = diesel::delete(batches::table.find(id.into_inner()))
                .execute(connection)
                .map_err(|err| translate_delete_error(err, EntityKind::Batch))?;
            Ok(removed > 0)
        })
        .await
    }
}

fn organization_to_row(organization: &Organization) -> OrganizationRow {
    OrganizationRow {
        id: organization.id().into_inner(),
        name: organization.name().as_str().to_owned(),
        kind: organization.kind().as_str().to_owned(),
        is_active: organization.is_active(),
        created_at: organization.created_at(),
        updated_at: organization.updated_at(),
    }
}

fn row_to_organization(row: OrganizationRow) -> RepositoryResult<Organization> {
    let OrganizationRow {
        id,
        name,
        kind,
        is_active,
        created_at,
        updated_at,
    } = row;
    Ok(Organization::from_persisted(PersistedOrganizationData {
        id: OrganizationId::from_uuid(id),
        name: RecordName::new(name).map_err(RepositoryError::persistence)?,
        kind: OrganizationKind::try_from(kind.as_str()).map_err(RepositoryError::persistence)?,
        is_active,
        created_at,
        updated_at,
    }))
}

fn project_to_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        organization_id: project.organization_id().into_inner(),
        name: project.name().as_str().to_owned(),
        status: project.status().as_str().to_owned(),
        kind: project.kind().as_str().to_owned(),
        metadata: project.metadata().cloned(),
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    }
}

fn row_to_project(row: ProjectRow) -> RepositoryResult<Project> {
    let ProjectRow {
        id,
        organization_id,
        name,
        status,
        kind,
        metadata,
        created_at,
        updated_at,
    } = row;
    Ok(Project::from_persisted(PersistedProjectData {
        id: ProjectId::from_uuid(id),
        organization_id: OrganizationId::from_uuid(organization_id),
        name: RecordName::new(name).map_err(RepositoryError::persistence)?,
        status: ProjectStatus::try_from(status.as_str()).map_err(RepositoryError::persistence)?,
        kind: ProjectKind::new(kind).map_err(RepositoryError::persistence)?,
        metadata,
        created_at,
        updated_at,
    }))
}

fn batch_to_row(batch: &Batch) -> BatchRow {
    BatchRow {
        id: batch.id().into_inner(),
        project_id: batch.project_id().into_inner(),
        name: batch.name().as_str().to_owned(),
        status: batch.status().as_str().to_owned(),
        settings: batch.settings().as_value().clone(),
        created_at: batch.created_at(),
        updated_at: batch.updated_at(),
    }
}

fn row_to_batch(row: BatchRow) -> RepositoryResult<Batch> {
    let BatchRow {
        id,
        project_id,
        name,
        status,
        settings,
        created_at,
        updated_at,
    } = row;
    Ok(Batch::from_persisted(PersistedBatchData {
        id: BatchId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        name: RecordName::new(name).map_err(RepositoryError::persistence)?,
        status: BatchStatus::try_from(status.as_str()).map_err(RepositoryError::persistence)?,
        settings: BatchSettings::new(settings).map_err(RepositoryError::persistence)?,
        created_at,
        updated_at,
    }))
}
