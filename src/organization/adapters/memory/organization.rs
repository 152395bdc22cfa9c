//! In-memory organization repository.

use crate::organization::{
    domain::{Organization, OrganizationId, OrganizationPatch, RecordName},
    ports::OrganizationRepository,
};
use crate::store::{
    ConflictReason, EntityKind, MemoryDatabase, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Organization repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrganizationRepository {
    db: MemoryDatabase,
}

impl InMemoryOrganizationRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }
}

fn sorted_by_name(mut organizations: Vec<Organization>) -> Vec<Organization> {
    organizations.sort_by(|left, right| left.name().cmp(right.name()));
    organizations
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn create(&self, organization: &Organization) -> RepositoryResult<()> {
        self.db.write(|tables| {
            if tables.organizations.contains_key(&organization.id()) {
                return Err(RepositoryError::duplicate(
                    EntityKind::Organization,
                    organization.id(),
                ));
            }
            if tables
                .organizations
                .values()
                .any(|existing| existing.name() == organization.name())
            {
                return Err(RepositoryError::duplicate(
                    EntityKind::Organization,
                    organization.name(),
                ));
            }
            tables
                .organizations
                .insert(organization.id(), organization.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>> {
        self.db
            .read(|tables| tables.organizations.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &RecordName) -> RepositoryResult<Option<Organization>> {
        self.db.read(|tables| {
            tables
                .organizations
                .values()
                .find(|organization| organization.name() == name)
                .cloned()
        })
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Organization>> {
        self.db
            .read(|tables| sorted_by_name(tables.organizations.values().cloned().collect()))
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Organization>> {
        self.db.read(|tables| {
            sorted_by_name(
                tables
                    .organizations
                    .values()
                    .filter(|organization| organization.is_active())
                    .cloned()
                    .collect(),
            )
        })
    }

    async fn update_partial(
        &self,
        id: OrganizationId,
        patch: &OrganizationPatch,
    ) -> RepositoryResult<Organization> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::Organization));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            if let Some(name) = &patch.name
                && tables
                    .organizations
                    .values()
                    .any(|other| other.id() != id && other.name() == name)
            {
                return Err(RepositoryError::duplicate(EntityKind::Organization, name));
            }
            let organization = tables
                .organizations
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Organization, id))?;
            organization.apply_patch(patch, at);
            Ok(organization.clone())
        })
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
        let at = self.db.now();
        let targets: BTreeSet<OrganizationId> = ids.iter().copied().collect();
        let deactivate = OrganizationPatch {
            is_active: Some(false),
            ..OrganizationPatch::default()
        };
        self.db.write(|tables| {
            let mut matched = 0_u64;
            for id in &targets {
                if let Some(organization) = tables.organizations.get_mut(id) {
                    organization.apply_patch(&deactivate, at);
                    matched += 1;
                }
            }
            Ok(matched)
        })
    }

    async fn delete(&self, id: OrganizationId) -> RepositoryResult<bool> {
        self.db.write(|tables| {
            if !tables.organizations.contains_key(&id) {
                return Ok(false);
            }
            if tables
                .projects
                .values()
                .any(|project| project.organization_id() == id)
            {
                return Err(RepositoryError::conflict(
                    EntityKind::Organization,
                    ConflictReason::HasDependents(EntityKind::Project),
                ));
            }
            tables.organizations.remove(&id);
            Ok(true)
        })
    }
}
