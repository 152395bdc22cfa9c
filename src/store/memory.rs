//! In-process store used by the in-memory adapters.

use crate::identity::domain::{AuthIdentity, AuthIdentityId, Portfolio, PortfolioId, User, UserId};
use crate::organization::domain::{Batch, BatchId, Organization, OrganizationId, Project, ProjectId};
use crate::store::{RepositoryError, RepositoryResult};
use crate::task::domain::{Task, TaskId, TaskTransition, TransitionId};
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Every table held by the in-memory store.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTables {
    pub(crate) organizations: BTreeMap<OrganizationId, Organization>,
    pub(crate) projects: BTreeMap<ProjectId, Project>,
    pub(crate) batches: BTreeMap<BatchId, Batch>,
    pub(crate) tasks: BTreeMap<TaskId, Task>,
    pub(crate) transitions: BTreeMap<TransitionId, TaskTransition>,
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) auth_identities: BTreeMap<AuthIdentityId, AuthIdentity>,
    pub(crate) portfolios: BTreeMap<PortfolioId, Portfolio>,
    last_transition_id: i64,
    last_auth_identity_id: i64,
    last_portfolio_id: i64,
}

impl MemoryTables {
    pub(crate) const fn next_transition_id(&mut self) -> TransitionId {
        self.last_transition_id += 1;
        TransitionId::new(self.last_transition_id)
    }

    pub(crate) const fn next_auth_identity_id(&mut self) -> AuthIdentityId {
        self.last_auth_identity_id += 1;
        AuthIdentityId::new(self.last_auth_identity_id)
    }

    pub(crate) const fn next_portfolio_id(&mut self) -> PortfolioId {
        self.last_portfolio_id += 1;
        PortfolioId::new(self.last_portfolio_id)
    }
}

/// Shared in-memory database handed to every in-memory repository.
///
/// Cloning is cheap and yields a handle to the same tables, so repositories
/// built from one database observe each other's writes and referential
/// rules span contexts the same way foreign keys do in `PostgreSQL`.
#[derive(Clone)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<MemoryTables>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl MemoryDatabase {
    /// Creates an empty database stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Creates an empty database stamped by the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(MemoryTables::default())),
            clock,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Runs `work` as one atomic unit.
    ///
    /// The closure mutates a copy of the tables; the copy replaces the live
    /// tables only when the closure returns `Ok`. Writers are serialized by
    /// the write lock, which gives every transaction a consistent snapshot.
    ///
    /// Copying the tables makes each call cost O(store size). The adapter
    /// backs tests and small embedded fixtures; larger stores belong in the
    /// Postgres adapter.
    pub(crate) fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut MemoryTables) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.tables.write().map_err(|err| {
            RepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut working = guard.clone();
        let outcome = work(&mut working)?;
        *guard = working;
        Ok(outcome)
    }

    /// [`Self::transaction`] for closures that only raise store errors.
    pub(crate) fn write<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut MemoryTables) -> RepositoryResult<T>,
    {
        self.transaction(work)
    }

    /// Runs a read-only closure against the committed tables.
    pub(crate) fn read<T, F>(&self, query: F) -> RepositoryResult<T>
    where
        F: FnOnce(&MemoryTables) -> T,
    {
        let guard = self.tables.read().map_err(|err| {
            RepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(query(&guard))
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase").finish_non_exhaustive()
    }
}
