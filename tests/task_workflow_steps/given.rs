//! Given steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use annotatex_workflow::identity::{
    adapters::memory::{InMemoryPortfolioRepository, InMemoryUserRepository},
    domain::{DisplayName, NewPortfolio, User, Username},
    ports::{PortfolioRepository, UserRepository},
};
use annotatex_workflow::organization::{
    adapters::memory::{
        InMemoryBatchRepository, InMemoryOrganizationRepository, InMemoryProjectRepository,
    },
    domain::{
        Batch, BatchPatch, BatchSettings, Organization, OrganizationKind, Project, ProjectKind,
        RecordName,
    },
    ports::{BatchRepository, OrganizationRepository, ProjectRepository},
};
use annotatex_workflow::task::domain::{CreateTaskRequest, TaskName, TaskStatus};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"an organization "{organization}" with project "{project}" and batch "{batch}""#)]
fn organization_hierarchy(
    world: &mut WorkflowWorld,
    organization: String,
    project: String,
    batch: String,
) -> Result<(), eyre::Report> {
    let clock = DefaultClock;
    let org = Organization::new(RecordName::new(organization)?, OrganizationKind::Client, &clock);
    run_async(InMemoryOrganizationRepository::new(world.db.clone()).create(&org))
        .wrap_err("store organization")?;
    let proj = Project::new(
        org.id(),
        RecordName::new(project)?,
        ProjectKind::new("annotation")?,
        &clock,
    );
    run_async(InMemoryProjectRepository::new(world.db.clone()).create(&proj))
        .wrap_err("store project")?;
    let stored_batch = Batch::new(
        proj.id(),
        RecordName::new(batch)?,
        BatchSettings::new(json!({}))?,
        &clock,
    );
    run_async(InMemoryBatchRepository::new(world.db.clone()).create(&stored_batch))
        .wrap_err("store batch")?;
    world.batch_id = Some(stored_batch.id());
    Ok(())
}

#[given(r#"the batch only allows "{statuses}""#)]
fn batch_vocabulary(world: &mut WorkflowWorld, statuses: String) -> Result<(), eyre::Report> {
    let batch_id = world
        .batch_id
        .ok_or_else(|| eyre::eyre!("missing batch in scenario world"))?;
    let allowed: Vec<&str> = statuses.split(',').map(str::trim).collect();
    let patch = BatchPatch {
        settings: Some(BatchSettings::new(
            json!({"workflow": {"statuses": allowed}}),
        )?),
        ..BatchPatch::default()
    };
    run_async(InMemoryBatchRepository::new(world.db.clone()).update_partial(batch_id, &patch))
        .wrap_err("restrict batch vocabulary")?;
    Ok(())
}

#[given(r#"a user "{username}""#)]
fn user_exists(world: &mut WorkflowWorld, username: String) -> Result<(), eyre::Report> {
    let user = User::new(Username::new(username.as_str())?, &DefaultClock);
    run_async(InMemoryUserRepository::new(world.db.clone()).create(&user))
        .wrap_err("store user")?;
    world.users.insert(username, user.id());
    Ok(())
}

#[given(r#"a task "{task}" in status "{status}" owned by "{owner}""#)]
fn task_exists(
    world: &mut WorkflowWorld,
    task: String,
    status: String,
    owner: String,
) -> Result<(), eyre::Report> {
    let batch_id = world
        .batch_id
        .ok_or_else(|| eyre::eyre!("missing batch in scenario world"))?;
    let owner_id = world.user(&owner)?;
    let request = CreateTaskRequest::new(batch_id, TaskName::new(task)?, TaskStatus::new(status)?)
        .with_owner(owner_id)
        .with_actor(owner_id);
    let created = run_async(world.service.create_task(request)).wrap_err("create task")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#""{username}" has a portfolio named "{display_name}""#)]
fn portfolio_exists(
    world: &mut WorkflowWorld,
    username: String,
    display_name: String,
) -> Result<(), eyre::Report> {
    let user_id = world.user(&username)?;
    let draft = NewPortfolio::new(user_id, DisplayName::new(display_name)?, &DefaultClock);
    let portfolio = run_async(InMemoryPortfolioRepository::new(world.db.clone()).create(draft))
        .wrap_err("store portfolio")?;
    world.portfolio = Some(portfolio);
    Ok(())
}
