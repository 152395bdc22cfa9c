//! `PostgreSQL` integration tests for the organization hierarchy.

use annotatex_workflow::error::{ClassifiedError, ErrorKind};
use annotatex_workflow::organization::{
    adapters::postgres::{
        PostgresBatchRepository, PostgresOrganizationRepository, PostgresProjectRepository,
    },
    domain::{
        Organization, OrganizationId, OrganizationKind, OrganizationPatch, Project, ProjectKind,
        ProjectPatch,
    },
    ports::{BatchRepository, OrganizationRepository, ProjectRepository},
};
use annotatex_workflow::store::{ConflictReason, EntityKind};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;

use crate::postgres::helpers::{name, seed_workspace, test_database};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_organization_name_is_a_conflict() {
    let db = test_database().expect("test database provisioned");
    let repo = PostgresOrganizationRepository::new(db.pool());
    repo.create(&Organization::new(
        name("dup"),
        OrganizationKind::Vendor,
        &DefaultClock,
    ))
    .await
    .expect("first insert succeeds");

    let err = repo
        .create(&Organization::new(
            name("dup"),
            OrganizationKind::Client,
            &DefaultClock,
        ))
        .await
        .expect_err("second insert must collide");

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(
        err.conflict_reason(),
        Some(ConflictReason::Duplicate(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_for_unknown_organization_is_a_missing_reference() {
    let db = test_database().expect("test database provisioned");
    let projects = PostgresProjectRepository::new(db.pool());
    let orphan = Project::new(
        OrganizationId::new(),
        name("core"),
        ProjectKind::new("annotation").expect("valid kind"),
        &DefaultClock,
    );

    let err = projects
        .create(&orphan)
        .await
        .expect_err("organization does not exist");

    assert_eq!(
        err.conflict_reason(),
        Some(&ConflictReason::MissingReference(EntityKind::Organization))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deletes_are_restricted_while_children_exist() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");

    let organization_err = PostgresOrganizationRepository::new(db.pool())
        .delete(ws.organization_id)
        .await
        .expect_err("organization has projects");
    let project_err = PostgresProjectRepository::new(db.pool())
        .delete(ws.project_id)
        .await
        .expect_err("project has batches");

    assert_eq!(
        organization_err.conflict_reason(),
        Some(&ConflictReason::HasDependents(EntityKind::Project))
    );
    assert_eq!(
        project_err.conflict_reason(),
        Some(&ConflictReason::HasDependents(EntityKind::Batch))
    );
    assert!(
        PostgresBatchRepository::new(db.pool())
            .find_by_id(ws.batch_id)
            .await
            .expect("lookup succeeds")
            .is_some()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_updates_touch_only_named_fields() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let organizations = PostgresOrganizationRepository::new(db.pool());
    let projects = PostgresProjectRepository::new(db.pool());

    let renamed = organizations
        .update_partial(
            ws.organization_id,
            &OrganizationPatch {
                name: Some(name("acme-labs")),
                ..OrganizationPatch::default()
            },
        )
        .await
        .expect("rename succeeds");
    let annotated = projects
        .update_partial(
            ws.project_id,
            &ProjectPatch {
                metadata: Some(Some(json!({"labels": ["cat", "dog"]}))),
                ..ProjectPatch::default()
            },
        )
        .await
        .expect("metadata set");
    let empty = projects
        .update_partial(ws.project_id, &ProjectPatch::default())
        .await
        .expect_err("empty patch");

    assert_eq!(renamed.name().as_str(), "acme-labs");
    assert_eq!(renamed.kind(), OrganizationKind::Client);
    assert_eq!(
        annotated.metadata(),
        Some(&json!({"labels": ["cat", "dog"]}))
    );
    assert_eq!(annotated.name().as_str(), "core");
    assert_eq!(empty.kind(), ErrorKind::Validation);
}
