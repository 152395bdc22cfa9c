//! In-memory user repository.

use crate::identity::{
    domain::{User, UserId, UserPatch, Username},
    ports::UserRepository,
};
use crate::store::{EntityKind, MemoryDatabase, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// User repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    db: MemoryDatabase,
}

impl InMemoryUserRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }

    fn users_where(&self, predicate: impl Fn(&User) -> bool) -> RepositoryResult<Vec<User>> {
        self.db.read(|tables| {
            let mut users: Vec<User> = tables
                .users
                .values()
                .filter(|user| predicate(*user))
                .cloned()
                .collect();
            users.sort_by(|left, right| left.username().cmp(right.username()));
            users
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        self.db.write(|tables| {
            if tables.users.contains_key(&user.id()) {
                return Err(RepositoryError::duplicate(EntityKind::User, user.id()));
            }
            if tables
                .users
                .values()
                .any(|existing| existing.username() == user.username())
            {
                return Err(RepositoryError::duplicate(EntityKind::User, user.username()));
            }
            tables.users.insert(user.id(), user.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.db.read(|tables| tables.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        self.db.read(|tables| {
            tables
                .users
                .values()
                .find(|user| user.username() == username)
                .cloned()
        })
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        self.users_where(|_| true)
    }

    async fn list_active(&self) -> RepositoryResult<Vec<User>> {
        self.users_where(User::is_active)
    }

    async fn update_partial(&self, id: UserId, patch: &UserPatch) -> RepositoryResult<User> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::User));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            if let Some(username) = &patch.username
                && tables
                    .users
                    .values()
                    .any(|other| other.id() != id && other.username() == username)
            {
                return Err(RepositoryError::duplicate(EntityKind::User, username));
            }
            let user = tables
                .users
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::not_found(EntityKind::User, id))?;
            user.apply_patch(patch, at);
            Ok(user.clone())
        })
    }

    async fn set_active(&self, id: UserId, active: bool) -> RepositoryResult<User> {
        let patch = UserPatch {
            is_active: Some(active),
            ..UserPatch::default()
        };
        self.update_partial(id, &patch).await
    }

    async fn bulk_deactivate(&self, ids: &[UserId]) -> RepositoryResult<u64> {
        let at = self.db.now();
        let targets: BTreeSet<UserId> = ids.iter().copied().collect();
        let deactivate = UserPatch {
            is_active: Some(false),
            ..UserPatch::default()
        };
        self.db.write(|tables| {
            let mut matched = 0_u64;
            for id in &targets {
                if let Some(user) = tables.users.get_mut(id) {
                    user.apply_patch(&deactivate, at);
                    matched += 1;
                }
            }
            Ok(matched)
        })
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<bool> {
        self.db.write(|tables| {
            if tables.users.remove(&id).is_none() {
                return Ok(false);
            }
            tables
                .auth_identities
                .retain(|_, identity| identity.user_id() != id);
            tables
                .portfolios
                .retain(|_, portfolio| portfolio.user_id() != id);
            for task in tables.tasks.values_mut() {
                task.detach_owner(id);
            }
            for transition in tables.transitions.values_mut() {
                transition.detach_user(id);
            }
            Ok(true)
        })
    }
}
