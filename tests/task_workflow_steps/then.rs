//! Then steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use annotatex_workflow::task::domain::TaskStatus;
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &WorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let stored = run_async(world.service.get_task(world.task()?.id())).wrap_err("reload task")?;
    if stored.current_status().as_str() != status {
        return Err(eyre::eyre!(
            "expected status {status}, found {}",
            stored.current_status()
        ));
    }
    Ok(())
}

#[then(r#"the task owner is "{owner}""#)]
fn task_owner_is(world: &WorkflowWorld, owner: String) -> Result<(), eyre::Report> {
    let expected = world.user(&owner)?;
    let stored = run_async(world.service.get_task(world.task()?.id())).wrap_err("reload task")?;
    if stored.current_owner() != Some(expected) {
        return Err(eyre::eyre!(
            "expected owner {owner}, found {:?}",
            stored.current_owner()
        ));
    }
    Ok(())
}

#[then(r#"the ledger records "{statuses}""#)]
fn ledger_records(world: &WorkflowWorld, statuses: String) -> Result<(), eyre::Report> {
    let history =
        run_async(world.service.audit_task(world.task()?.id())).wrap_err("audit ledger")?;
    let recorded: Vec<&str> = history
        .iter()
        .map(|entry| entry.to_status().as_str())
        .collect();
    let expected: Vec<&str> = statuses.split('>').map(str::trim).collect();
    if recorded != expected {
        return Err(eyre::eyre!("expected ledger {expected:?}, found {recorded:?}"));
    }

    let pre_states: Vec<Option<&str>> = history
        .iter()
        .map(|entry| entry.from_status().map(TaskStatus::as_str))
        .collect();
    let chained: Vec<Option<&str>> = std::iter::once(None)
        .chain(expected.iter().copied().map(Some))
        .take(expected.len())
        .collect();
    if pre_states != chained {
        return Err(eyre::eyre!(
            "ledger is not chained: pre-states {pre_states:?}, expected {chained:?}"
        ));
    }
    Ok(())
}

#[then(r#"the request fails with a "{kind}" error"#)]
fn request_fails_with(world: &WorkflowWorld, kind: String) -> Result<(), eyre::Report> {
    match world.last_failure {
        Some(actual) if actual.as_str() == kind => Ok(()),
        Some(actual) => Err(eyre::eyre!("expected a {kind} error, got {actual}")),
        None => Err(eyre::eyre!("expected a {kind} error, but the request succeeded")),
    }
}
