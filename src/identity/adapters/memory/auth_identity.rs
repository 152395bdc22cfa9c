//! In-memory authentication identity repository.

use crate::identity::{
    domain::{
        AuthIdentity, AuthIdentityId, AuthIdentityPatch, AuthProvider, AuthSubject,
        NewAuthIdentity, User, UserId,
    },
    ports::AuthIdentityRepository,
};
use crate::store::memory::MemoryTables;
use crate::store::{
    ConflictReason, EntityKind, MemoryDatabase, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;

/// Identity repository backed by a [`MemoryDatabase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthIdentityRepository {
    db: MemoryDatabase,
}

impl InMemoryAuthIdentityRepository {
    /// Creates a repository over the shared database.
    #[must_use]
    pub const fn new(db: MemoryDatabase) -> Self {
        Self { db }
    }
}

fn identity_key(provider: &AuthProvider, subject: &AuthSubject) -> String {
    format!("{provider}:{subject}")
}

fn find_identity_mut<'a>(
    tables: &'a mut MemoryTables,
    matches: impl Fn(&AuthIdentity) -> bool,
) -> Option<&'a mut AuthIdentity> {
    tables
        .auth_identities
        .values_mut()
        .find(|identity| matches(identity))
}

#[async_trait]
impl AuthIdentityRepository for InMemoryAuthIdentityRepository {
    async fn add(&self, identity: NewAuthIdentity) -> RepositoryResult<AuthIdentity> {
        self.db.write(move |tables| {
            if !tables.users.contains_key(&identity.user_id()) {
                return Err(RepositoryError::conflict(
                    EntityKind::AuthIdentity,
                    ConflictReason::MissingReference(EntityKind::User),
                ));
            }
            if tables.auth_identities.values().any(|existing| {
                existing.provider() == identity.provider()
                    && existing.subject() == identity.subject()
            }) {
                return Err(RepositoryError::duplicate(
                    EntityKind::AuthIdentity,
                    identity_key(identity.provider(), identity.subject()),
                ));
            }
            let id = tables.next_auth_identity_id();
            let stored = identity.into_identity(id);
            tables.auth_identities.insert(id, stored.clone());
            Ok(stored)
        })
    }

    async fn find_by_provider_subject(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<AuthIdentity>> {
        self.db.read(|tables| {
            tables
                .auth_identities
                .values()
                .find(|identity| identity.provider() == provider && identity.subject() == subject)
                .cloned()
        })
    }

    async fn find_user_by_identity(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<User>> {
        self.db.read(|tables| {
            tables
                .auth_identities
                .values()
                .find(|identity| identity.provider() == provider && identity.subject() == subject)
                .and_then(|identity| tables.users.get(&identity.user_id()))
                .cloned()
        })
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<AuthIdentity>> {
        self.db.read(|tables| {
            tables
                .auth_identities
                .values()
                .filter(|identity| identity.user_id() == user_id)
                .cloned()
                .collect()
        })
    }

    async fn touch_last_login(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<AuthIdentity> {
        let at = self.db.now();
        self.db.write(|tables| {
            let identity = find_identity_mut(tables, |identity| {
                identity.provider() == provider && identity.subject() == subject
            })
            .ok_or_else(|| {
                RepositoryError::not_found(EntityKind::AuthIdentity, identity_key(provider, subject))
            })?;
            identity.record_login(at);
            Ok(identity.clone())
        })
    }

    async fn update_partial(
        &self,
        user_id: UserId,
        provider: &AuthProvider,
        patch: &AuthIdentityPatch,
    ) -> RepositoryResult<AuthIdentity> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::AuthIdentity));
        }
        let at = self.db.now();
        self.db.write(|tables| {
            let identity = find_identity_mut(tables, |identity| {
                identity.user_id() == user_id && identity.provider() == provider
            })
            .ok_or_else(|| {
                RepositoryError::not_found(EntityKind::AuthIdentity, format!("{user_id}:{provider}"))
            })?;
            identity.apply_patch(patch, at);
            Ok(identity.clone())
        })
    }

    async fn delete(&self, id: AuthIdentityId) -> RepositoryResult<u64> {
        self.db.write(|tables| {
            Ok(u64::from(tables.auth_identities.remove(&id).is_some()))
        })
    }
}
