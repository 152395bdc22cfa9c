//! Shared fixtures for the in-memory integration suite.

use std::sync::Arc;

use annotatex_workflow::identity::{
    adapters::memory::InMemoryUserRepository,
    domain::{User, UserId, Username},
    ports::UserRepository,
};
use annotatex_workflow::organization::{
    adapters::memory::{
        InMemoryBatchRepository, InMemoryOrganizationRepository, InMemoryProjectRepository,
    },
    domain::{
        Batch, BatchId, BatchSettings, Organization, OrganizationId, OrganizationKind, Project,
        ProjectId, ProjectKind, RecordName,
    },
    ports::{BatchRepository, OrganizationRepository, ProjectRepository},
};
use annotatex_workflow::store::MemoryDatabase;
use annotatex_workflow::task::{
    adapters::memory::InMemoryTaskRepository, domain::TaskStatus, services::TaskWorkflowService,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;

/// Workflow engine over the in-memory task adapter.
pub type MemoryWorkflow = TaskWorkflowService<InMemoryTaskRepository, DefaultClock>;

/// Seeded `acme / core / b1` hierarchy with two users.
pub struct Workspace {
    pub db: MemoryDatabase,
    pub service: MemoryWorkflow,
    pub organization_id: OrganizationId,
    pub project_id: ProjectId,
    pub batch_id: BatchId,
    pub alice: UserId,
    pub bob: UserId,
}

/// Provides a fresh, empty in-memory store.
#[fixture]
pub fn db() -> MemoryDatabase {
    MemoryDatabase::new()
}

/// Builds a valid status for test input.
///
/// # Panics
///
/// Panics when `value` is blank.
#[must_use]
pub fn status(value: &str) -> TaskStatus {
    TaskStatus::new(value).expect("valid status")
}

/// Builds a valid record name for test input.
///
/// # Panics
///
/// Panics when `value` is blank.
#[must_use]
pub fn name(value: &str) -> RecordName {
    RecordName::new(value).expect("valid record name")
}

/// Seeds an organization, project, batch and two users.
///
/// # Errors
///
/// Returns an error if any seed row is rejected by the store.
pub async fn seed_workspace(settings: Value) -> eyre::Result<Workspace> {
    let db = MemoryDatabase::new();
    let clock = DefaultClock;

    let organization = Organization::new(name("acme"), OrganizationKind::Client, &clock);
    InMemoryOrganizationRepository::new(db.clone())
        .create(&organization)
        .await?;
    let project = Project::new(
        organization.id(),
        name("core"),
        ProjectKind::new("annotation")?,
        &clock,
    );
    InMemoryProjectRepository::new(db.clone())
        .create(&project)
        .await?;
    let batch = Batch::new(project.id(), name("b1"), BatchSettings::new(settings)?, &clock);
    InMemoryBatchRepository::new(db.clone()).create(&batch).await?;

    let users = InMemoryUserRepository::new(db.clone());
    let alice = User::new(Username::new("alice")?, &clock);
    let bob = User::new(Username::new("bob")?, &clock);
    users.create(&alice).await?;
    users.create(&bob).await?;

    let service = TaskWorkflowService::new(
        Arc::new(InMemoryTaskRepository::new(db.clone())),
        Arc::new(DefaultClock),
    );
    Ok(Workspace {
        db,
        service,
        organization_id: organization.id(),
        project_id: project.id(),
        batch_id: batch.id(),
        alice: alice.id(),
        bob: bob.id(),
    })
}
