//! In-memory integration tests for the task workflow engine.

use std::collections::BTreeSet;

use annotatex_workflow::error::{ClassifiedError, ErrorKind};
use annotatex_workflow::identity::{
    adapters::memory::InMemoryUserRepository, domain::UserId, ports::UserRepository,
};
use annotatex_workflow::task::domain::{
    CreateTaskRequest, Task, TaskName, TaskStatus, TaskTransition, TransitionGraph,
    TransitionRequest,
};
use rstest::rstest;
use serde_json::json;

use crate::in_memory::helpers::{MemoryWorkflow, Workspace, seed_workspace, status};

fn steps(history: &[TaskTransition]) -> Vec<(Option<&str>, &str)> {
    history
        .iter()
        .map(|entry| {
            (
                entry.from_status().map(TaskStatus::as_str),
                entry.to_status().as_str(),
            )
        })
        .collect()
}

async fn create(service: &MemoryWorkflow, ws: &Workspace, task_name: &str, initial: &str) -> Task {
    service
        .create_task(
            CreateTaskRequest::new(
                ws.batch_id,
                TaskName::new(task_name).expect("valid task name"),
                status(initial),
            )
            .with_actor(ws.alice),
        )
        .await
        .expect("task created")
}

async fn move_to(service: &MemoryWorkflow, task: &Task, actor: UserId, target: &str) {
    service
        .transition(TransitionRequest::new(task.id(), actor, status(target)), None)
        .await
        .expect("transition applied");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_flow_records_a_chained_ledger() {
    let ws = seed_workspace(json!({})).await.expect("seeded workspace");
    let task = create(&ws.service, &ws, "t1", "pending").await;

    move_to(&ws.service, &task, ws.alice, "in_review").await;
    move_to(&ws.service, &task, ws.bob, "done").await;

    let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");
    assert_eq!(
        steps(&history),
        vec![
            (None, "pending"),
            (Some("pending"), "in_review"),
            (Some("in_review"), "done"),
        ]
    );
    assert_eq!(history[0].actor_id(), Some(ws.alice));
    let reloaded = ws.service.get_task(task.id()).await.expect("task exists");
    assert_eq!(reloaded.current_status(), &status("done"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn vocabulary_and_graph_both_gate_transitions() {
    let ws = seed_workspace(json!({"workflow": {"statuses": ["pending", "in_review", "done"]}}))
        .await
        .expect("seeded workspace");
    let service = ws.service.clone().with_default_graph(
        TransitionGraph::new()
            .allow(status("pending"), status("in_review"))
            .allow(status("in_review"), status("done")),
    );
    let task = create(&service, &ws, "t1", "pending").await;

    let outside = service
        .transition(TransitionRequest::new(task.id(), ws.alice, status("rejected")), None)
        .await
        .expect_err("rejected is outside the vocabulary");
    let skipped = service
        .transition(TransitionRequest::new(task.id(), ws.alice, status("done")), None)
        .await
        .expect_err("pending cannot jump straight to done");
    move_to(&service, &task, ws.alice, "in_review").await;
    move_to(&service, &task, ws.bob, "done").await;

    assert_eq!(outside.kind(), ErrorKind::InvalidTransition);
    assert_eq!(skipped.kind(), ErrorKind::InvalidTransition);
    assert_eq!(
        service.get_history(task.id()).await.expect("history").len(),
        3
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_in_a_batch_are_listed_in_creation_order() {
    let ws = seed_workspace(json!({})).await.expect("seeded workspace");
    let first = create(&ws.service, &ws, "t1", "pending").await;
    let second = create(&ws.service, &ws, "t2", "pending").await;
    let third = create(&ws.service, &ws, "t3", "pending").await;
    assert!(ws.service.soft_delete_task(second.id()).await.expect("deleted"));

    let visible = ws
        .service
        .list_tasks(ws.batch_id, false)
        .await
        .expect("listing succeeds");
    let everything = ws
        .service
        .list_tasks(ws.batch_id, true)
        .await
        .expect("listing succeeds");

    assert_eq!(
        visible.iter().map(|task| task.id()).collect::<Vec<_>>(),
        vec![first.id(), third.id()]
    );
    assert_eq!(everything.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_a_user_keeps_the_ledger_anonymised() {
    let ws = seed_workspace(json!({})).await.expect("seeded workspace");
    let task = create(&ws.service, &ws, "t1", "pending").await;
    ws.service
        .transition(
            TransitionRequest::new(task.id(), ws.bob, status("in_review")).with_owner(ws.bob),
            None,
        )
        .await
        .expect("transition applied");

    let users = InMemoryUserRepository::new(ws.db.clone());
    assert!(users.delete(ws.bob).await.expect("user deleted"));

    let reloaded = ws.service.get_task(task.id()).await.expect("task exists");
    let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");
    assert_eq!(reloaded.current_owner(), None);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].actor_id(), None);
    assert_eq!(history[1].owner(), None);
    assert_eq!(history[0].actor_id(), Some(ws.alice));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_transitions_on_many_tasks_stay_serialised() {
    let ws = seed_workspace(json!({})).await.expect("seeded workspace");
    let mut tasks = Vec::new();
    for index in 0..4 {
        tasks.push(create(&ws.service, &ws, &format!("t{index}"), "s0").await);
    }

    let mut handles = Vec::new();
    for task in &tasks {
        for step in 1..=8 {
            let service = ws.service.clone();
            let task_id = task.id();
            let actor = ws.alice;
            handles.push(tokio::spawn(async move {
                service
                    .transition(
                        TransitionRequest::new(task_id, actor, status(&format!("s{step}"))),
                        None,
                    )
                    .await
            }));
        }
    }
    for handle in handles {
        handle
            .await
            .expect("task joined")
            .expect("transition applied");
    }

    for task in &tasks {
        let history = ws
        .service
        .audit_task(task.id())
        .await
        .expect("ledger is consistent");
        let pre_states: BTreeSet<_> = history
            .iter()
            .filter_map(TaskTransition::from_status)
            .collect();
        assert_eq!(history.len(), 9);
        assert_eq!(pre_states.len(), 8);
    }
}
