//! In-memory integration tests for the workflow API boundary.

use annotatex_workflow::api::{
    ApiError, CreateTaskPayload, ListTasksPayload, ReassignTaskPayload, TaskRefPayload,
    TransitionTaskPayload, WorkflowApi,
};
use annotatex_workflow::error::ErrorKind;
use annotatex_workflow::task::{adapters::memory::InMemoryTaskRepository, domain::Task};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

use crate::in_memory::helpers::{Workspace, seed_workspace, status};

type MemoryApi = WorkflowApi<InMemoryTaskRepository, DefaultClock>;

async fn api_workspace() -> (Workspace, MemoryApi) {
    let ws = seed_workspace(json!({"workflow": {"statuses": ["pending", "in_review", "done"]}}))
        .await
        .expect("seeded workspace");
    let api = WorkflowApi::new(ws.service.clone());
    (ws, api)
}

fn payload<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("well-formed payload")
}

async fn create_pending(ws: &Workspace, api: &MemoryApi) -> Task {
    api.create_task(payload::<CreateTaskPayload>(json!({
        "batchId": ws.batch_id.to_string(),
        "name": "t1",
        "initialStatus": "pending",
        "actorId": ws.alice.to_string(),
    })))
    .await
    .expect("task created")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn string_payloads_drive_the_full_workflow() {
    let (ws, api) = api_workspace().await;
    let task = create_pending(&ws, &api).await;

    api.transition_task(payload(json!({
        "taskId": task.id().to_string(),
        "actorId": ws.alice.to_string(),
        "toStatus": "in_review",
        "owner": ws.bob.to_string(),
    })))
    .await
    .expect("moved to review");
    let done = api
        .transition_task(payload(json!({
            "taskId": task.id().to_string(),
            "actorId": ws.bob.to_string(),
            "toStatus": "done",
            "expectedStatus": "in_review",
        })))
        .await
        .expect("moved to done");
    let history = api
        .get_task_history(payload(json!({"taskId": task.id().to_string()})))
        .await
        .expect("history available");

    assert_eq!(done.current_status(), &status("done"));
    assert_eq!(done.current_owner(), Some(ws.bob));
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].from_status(), Some(&status("in_review")));
}

#[rstest]
#[case::bad_task_id(json!({"taskId": "nope", "actorId": "00000000-0000-0000-0000-000000000000", "toStatus": "done"}), "taskId")]
#[case::bad_actor_id(json!({"taskId": "00000000-0000-0000-0000-000000000000", "actorId": "42", "toStatus": "done"}), "actorId")]
#[case::blank_status(json!({"taskId": "00000000-0000-0000-0000-000000000000", "actorId": "00000000-0000-0000-0000-000000000000", "toStatus": "  "}), "status")]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_transition_payloads_are_validation_errors(
    #[case] body: Value,
    #[case] mentions: &str,
) {
    let (_ws, api) = api_workspace().await;

    let err: ApiError = api
        .transition_task(payload::<TransitionTaskPayload>(body))
        .await
        .expect_err("payload is malformed");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.status, 400);
    assert!(err.message.contains(mentions), "message: {}", err.message);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn workflow_failures_map_to_status_codes() {
    let (ws, api) = api_workspace().await;
    let task = create_pending(&ws, &api).await;

    let unknown = api
        .get_task(payload(json!({"taskId": uuid::Uuid::new_v4().to_string()})))
        .await
        .expect_err("unknown task");
    let outside = api
        .transition_task(payload(json!({
            "taskId": task.id().to_string(),
            "actorId": ws.alice.to_string(),
            "toStatus": "archived",
        })))
        .await
        .expect_err("status outside vocabulary");
    let unreachable = api
        .transition_task(payload(json!({
            "taskId": task.id().to_string(),
            "actorId": ws.alice.to_string(),
            "toStatus": "done",
            "graph": {"pending": ["in_review"]},
        })))
        .await
        .expect_err("graph forbids the jump");
    let stale = api
        .transition_task(payload(json!({
            "taskId": task.id().to_string(),
            "actorId": ws.alice.to_string(),
            "toStatus": "done",
            "expectedStatus": "in_review",
        })))
        .await
        .expect_err("expectation is stale");

    assert_eq!((unknown.kind, unknown.status), (ErrorKind::NotFound, 404));
    assert_eq!(
        (outside.kind, outside.status),
        (ErrorKind::InvalidTransition, 400)
    );
    assert_eq!(
        (unreachable.kind, unreachable.status),
        (ErrorKind::InvalidTransition, 400)
    );
    assert_eq!((stale.kind, stale.status), (ErrorKind::Conflict, 409));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_delete_and_list_round_out_the_surface() {
    let (ws, api) = api_workspace().await;
    let task = create_pending(&ws, &api).await;
    let task_ref = json!({"taskId": task.id().to_string()});

    let reassigned = api
        .reassign_task(payload::<ReassignTaskPayload>(json!({
            "taskId": task.id().to_string(),
            "newOwner": ws.bob.to_string(),
        })))
        .await
        .expect("owner reassigned");
    let first = api
        .soft_delete_task(payload::<TaskRefPayload>(task_ref.clone()))
        .await
        .expect("deleted");
    let second = api
        .soft_delete_task(payload::<TaskRefPayload>(task_ref))
        .await
        .expect("repeat delete is accepted");
    let visible = api
        .list_tasks(payload::<ListTasksPayload>(json!({
            "batchId": ws.batch_id.to_string(),
        })))
        .await
        .expect("listing succeeds");
    let everything = api
        .list_tasks(payload::<ListTasksPayload>(json!({
            "batchId": ws.batch_id.to_string(),
            "includeDeleted": true,
        })))
        .await
        .expect("listing succeeds");

    assert_eq!(reassigned.current_owner(), Some(ws.bob));
    assert!(first.deleted);
    assert!(!second.deleted);
    assert!(visible.is_empty());
    assert_eq!(everything.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cloned_api_handles_concurrent_requests() {
    let (ws, api) = api_workspace().await;
    let task = create_pending(&ws, &api).await;

    let handles: Vec<_> = [(ws.alice, "in_review"), (ws.bob, "done")]
        .into_iter()
        .map(|(actor, target)| {
            let worker = api.clone();
            let body = json!({
                "taskId": task.id().to_string(),
                "actorId": actor.to_string(),
                "toStatus": target,
            });
            tokio::spawn(async move { worker.transition_task(payload(body)).await })
        })
        .collect();
    for handle in handles {
        handle
            .await
            .expect("request joined")
            .expect("transition applied");
    }

    let history = api
        .get_task_history(payload(json!({"taskId": task.id().to_string()})))
        .await
        .expect("history available");
    assert_eq!(history.len(), 3);
}
