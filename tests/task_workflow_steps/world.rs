//! Shared world state for task workflow BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use annotatex_workflow::error::ErrorKind;
use annotatex_workflow::identity::domain::{Portfolio, UserId};
use annotatex_workflow::organization::domain::BatchId;
use annotatex_workflow::store::MemoryDatabase;
use annotatex_workflow::task::{
    adapters::memory::InMemoryTaskRepository, domain::Task, services::TaskWorkflowService,
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestWorkflowService = TaskWorkflowService<InMemoryTaskRepository, DefaultClock>;

/// Scenario world for task workflow behaviour tests.
pub struct WorkflowWorld {
    pub db: MemoryDatabase,
    pub service: TestWorkflowService,
    pub batch_id: Option<BatchId>,
    pub users: HashMap<String, UserId>,
    pub task: Option<Task>,
    pub portfolio: Option<Portfolio>,
    pub last_failure: Option<ErrorKind>,
}

impl WorkflowWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let db = MemoryDatabase::new();
        let service = TaskWorkflowService::new(
            Arc::new(InMemoryTaskRepository::new(db.clone())),
            Arc::new(DefaultClock),
        );
        Self {
            db,
            service,
            batch_id: None,
            users: HashMap::new(),
            task: None,
            portfolio: None,
            last_failure: None,
        }
    }

    /// Resolves a user created by an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when no user with that name was created.
    pub fn user(&self, username: &str) -> eyre::Result<UserId> {
        self.users
            .get(username)
            .copied()
            .ok_or_else(|| eyre::eyre!("user {username} was not created in this scenario"))
    }

    /// Returns the task created by an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was created.
    pub fn task(&self) -> eyre::Result<&Task> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
    }
}

impl Default for WorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> WorkflowWorld {
    WorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
