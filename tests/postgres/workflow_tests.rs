//! `PostgreSQL` integration tests for the task workflow engine.

use std::collections::BTreeSet;

use annotatex_workflow::error::{ClassifiedError, ErrorKind};
use annotatex_workflow::identity::{
    adapters::postgres::PostgresUserRepository, domain::UserId, ports::UserRepository,
};
use annotatex_workflow::organization::{
    adapters::postgres::PostgresBatchRepository,
    domain::{BatchId, BatchPatch, BatchStatus},
    ports::BatchRepository,
};
use annotatex_workflow::store::{ConflictReason, EntityKind, RepositoryError};
use annotatex_workflow::task::{
    domain::{CreateTaskRequest, Task, TaskName, TaskStatus, TaskTransition, TransitionRequest},
    ports::TaskRepositoryError,
    services::TaskWorkflowError,
};
use diesel::connection::SimpleConnection;
use rstest::rstest;
use serde_json::json;

use crate::postgres::helpers::{PgWorkflow, seed_workspace, status, test_database};

fn request(batch_id: BatchId, initial: &str) -> CreateTaskRequest {
    CreateTaskRequest::new(
        batch_id,
        TaskName::new("t1").expect("valid task name"),
        status(initial),
    )
}

async fn move_to(service: &PgWorkflow, task: &Task, actor: UserId, target: &str) -> Task {
    service
        .transition(TransitionRequest::new(task.id(), actor, status(target)), None)
        .await
        .expect("transition applied")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_flow_records_a_chained_ledger() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(request(ws.batch_id, "pending").with_owner(ws.alice))
        .await
        .expect("task created");

    move_to(&ws.service, &task, ws.alice, "in_review").await;
    let done = move_to(&ws.service, &task, ws.bob, "done").await;
    let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");

    let steps: Vec<_> = history
        .iter()
        .map(|entry| {
            (
                entry.from_status().map(TaskStatus::as_str),
                entry.to_status().as_str(),
            )
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            (None, "pending"),
            (Some("pending"), "in_review"),
            (Some("in_review"), "done"),
        ]
    );
    assert_eq!(done.current_owner(), Some(ws.alice));
    let reloaded = ws.service.get_task(task.id()).await.expect("reloaded");
    assert_eq!(reloaded.current_status(), done.current_status());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_creation_writes_nothing() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({"workflow": {"statuses": ["pending"]}}))
        .await
        .expect("seeded workspace");

    let outside = ws
        .service
        .create_task(request(ws.batch_id, "draft"))
        .await
        .expect_err("draft is outside the vocabulary");
    let unknown_owner = ws
        .service
        .create_task(request(ws.batch_id, "pending").with_owner(UserId::new()))
        .await
        .expect_err("owner does not exist");
    let missing_batch = ws
        .service
        .create_task(request(BatchId::new(), "pending"))
        .await
        .expect_err("batch does not exist");

    assert_eq!(outside.kind(), ErrorKind::InvalidTransition);
    assert_eq!(unknown_owner.kind(), ErrorKind::Conflict);
    assert!(matches!(
        missing_batch,
        TaskWorkflowError::Repository(TaskRepositoryError::Store(RepositoryError::Conflict {
            reason: ConflictReason::MissingReference(EntityKind::Batch),
            ..
        }))
    ));
    assert!(
        ws.service
            .list_tasks(ws.batch_id, true)
            .await
            .expect("listing succeeds")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archived_batch_refuses_new_tasks() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    PostgresBatchRepository::new(db.pool())
        .update_partial(
            ws.batch_id,
            &BatchPatch {
                status: Some(BatchStatus::Archived),
                ..BatchPatch::default()
            },
        )
        .await
        .expect("batch archived");

    let err = ws
        .service
        .create_task(request(ws.batch_id, "pending"))
        .await
        .expect_err("archived batch");

    assert!(matches!(
        err,
        TaskWorkflowError::Repository(TaskRepositoryError::Store(RepositoryError::Conflict {
            reason: ConflictReason::Archived,
            ..
        }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_expectation_and_unknown_actor_roll_back() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(request(ws.batch_id, "pending"))
        .await
        .expect("task created");

    let stale = ws
        .service
        .transition(
            TransitionRequest::new(task.id(), ws.alice, status("done"))
                .expecting(status("in_review")),
            None,
        )
        .await
        .expect_err("expectation is stale");
    let unknown_actor = ws
        .service
        .transition(
            TransitionRequest::new(task.id(), UserId::new(), status("done")),
            None,
        )
        .await
        .expect_err("actor does not exist");

    assert!(matches!(
        stale,
        TaskWorkflowError::Repository(TaskRepositoryError::Store(RepositoryError::Conflict {
            reason: ConflictReason::StaleStatus { .. },
            ..
        }))
    ));
    assert_eq!(unknown_actor.kind(), ErrorKind::Conflict);
    let reloaded = ws.service.get_task(task.id()).await.expect("task exists");
    assert_eq!(reloaded.current_status(), &status("pending"));
    assert_eq!(
        ws.service.get_history(task.id()).await.expect("history").len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_transitions_serialise_on_the_task_row() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(request(ws.batch_id, "s0"))
        .await
        .expect("task created");

    let mut handles = Vec::new();
    for (step, actor) in (1..=12).zip([ws.alice, ws.bob].into_iter().cycle()) {
        let service = ws.service.clone();
        let task_id = task.id();
        handles.push(tokio::spawn(async move {
            service
                .transition(
                    TransitionRequest::new(task_id, actor, status(&format!("s{step}"))),
                    None,
                )
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task joined")
            .expect("transition applied");
    }

    let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");
    let pre_states: BTreeSet<_> = history
        .iter()
        .filter_map(TaskTransition::from_status)
        .collect();
    assert_eq!(history.len(), 13);
    assert_eq!(pre_states.len(), 12);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_deletes_racing_transitions_report_dependents() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(request(ws.batch_id, "s0"))
        .await
        .expect("task created");
    let batches = PostgresBatchRepository::new(db.pool());

    let mut transitions = Vec::new();
    let mut deletes = Vec::new();
    for step in 1..=4 {
        let service = ws.service.clone();
        let task_id = task.id();
        let actor = ws.alice;
        transitions.push(tokio::spawn(async move {
            service
                .transition(
                    TransitionRequest::new(task_id, actor, status(&format!("s{step}"))),
                    None,
                )
                .await
        }));
        let repo = batches.clone();
        let batch_id = ws.batch_id;
        deletes.push(tokio::spawn(async move { repo.delete(batch_id).await }));
    }

    for handle in transitions {
        handle
            .await
            .expect("task joined")
            .expect("transition applied");
    }
    for handle in deletes {
        let err = handle
            .await
            .expect("task joined")
            .expect_err("batch still has a task");
        assert!(
            matches!(
                err,
                RepositoryError::Conflict {
                    reason: ConflictReason::HasDependents(EntityKind::Task),
                    ..
                }
            ),
            "unexpected error: {err}"
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_nulls_references_but_keeps_history() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(
            request(ws.batch_id, "pending")
                .with_owner(ws.bob)
                .with_actor(ws.bob),
        )
        .await
        .expect("task created");
    move_to(&ws.service, &task, ws.bob, "in_review").await;

    assert!(
        PostgresUserRepository::new(db.pool())
            .delete(ws.bob)
            .await
            .expect("user deleted")
    );

    let reloaded = ws.service.get_task(task.id()).await.expect("task exists");
    let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");
    assert_eq!(reloaded.current_owner(), None);
    assert_eq!(history.len(), 2);
    assert!(
        history
            .iter()
            .all(|entry| entry.actor_id().is_none() && entry.owner().is_none())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ledger_rows_reject_in_place_edits() {
    let db = test_database().expect("test database provisioned");
    let ws = seed_workspace(&db.pool(), json!({}))
        .await
        .expect("seeded workspace");
    let task = ws
        .service
        .create_task(request(ws.batch_id, "pending"))
        .await
        .expect("task created");
    let mut conn = db.connect().expect("connection");

    let rewrite = conn.batch_execute(&format!(
        "UPDATE task_transitions SET to_status = 'done' WHERE task_id = '{}'",
        task.id()
    ));

    assert!(rewrite.is_err(), "append-only trigger must fire");
    let history = ws.service.get_history(task.id()).await.expect("history");
    assert_eq!(history[0].to_status(), &status("pending"));
}
