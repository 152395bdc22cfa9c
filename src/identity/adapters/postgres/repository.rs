//! `PostgreSQL` repositories for users, identities and portfolios.

use super::models::{
    AuthIdentityChangeset, AuthIdentityRow, NewAuthIdentityRow, NewPortfolioRow, PortfolioRow,
    UserChangeset, UserRow,
};
use crate::identity::{
    domain::{
        AuthIdentity, AuthIdentityId, AuthIdentityPatch, AuthProvider, AuthSubject, DisplayName,
        NewAuthIdentity, NewPortfolio, PasswordCredential, PersistedAuthIdentityData,
        PersistedPortfolioData, PersistedUserData, Portfolio, PortfolioId, PortfolioPatch, User,
        UserId, UserPatch, Username,
    },
    ports::{AuthIdentityRepository, PortfolioRepository, UserRepository},
};
use crate::store::postgres::{
    PgPool, read_error, run_blocking, run_in_transaction,
    schema::{auth_identities, user_portfolios, users},
    translate_delete_error, translate_write_error,
};
use crate::store::{EntityKind, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;

/// `PostgreSQL`-backed user repository.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `PostgreSQL`-backed authentication identity repository.
#[derive(Debug, Clone)]
pub struct PostgresAuthIdentityRepository {
    pool: PgPool,
}

impl PostgresAuthIdentityRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `PostgreSQL`-backed portfolio repository.
#[derive(Debug, Clone)]
pub struct PostgresPortfolioRepository {
    pool: PgPool,
}

impl PostgresPortfolioRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let row = UserRow {
            id: user.id().into_inner(),
            username: user.username().as_str().to_owned(),
            is_active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::User))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .find(id.into_inner())
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        let lookup = username.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::username.eq(lookup))
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .order(users::username.asc())
                .select(UserRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::is_active.eq(true))
                .order(users::username.asc())
                .select(UserRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn update_partial(&self, id: UserId, patch: &UserPatch) -> RepositoryResult<User> {
        if patch.is_empty() {
            return Err(RepositoryError::empty_patch(EntityKind::User));
        }
        let changeset = UserChangeset {
            username: patch
                .username
                .as_ref()
                .map(|username| username.as_str().to_owned()),
            is_active: patch.is_active,
        };
        run_in_transaction(&self.pool, EntityKind::User, move |connection| {
            diesel::update(users::table.find(id.into_inner()))
                .set((&changeset, users::updated_at.eq(now)))
                .returning(UserRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::User))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::User, id))
                .and_then(row_to_user)
        })
        .await
    }

    async fn set_active(&self, id: UserId, active: bool) -> RepositoryResult<User> {
        let patch = UserPatch {
            is_active: Some(active),
            ..UserPatch::default()
        };
        self.update_partial(id, &patch).await
    }

    async fn bulk_deactivate(&self, ids: &[UserId]) -> RepositoryResult<u64> {
        let targets: Vec<uuid::Uuid> = ids.iter().copied().map(UserId::into_inner).collect();
        run_in_transaction(&self.pool, EntityKind::User, move |connection| {
            let matched = diesel::update(users::table.filter(users::id.eq_any(targets)))
                .set((users::is_active.eq(false), users::updated_at.eq(now)))
                .execute(connection)
                .map_err(|err| translate_write_error(err, EntityKind::User))?;
            u64::try_from(matched).map_err(RepositoryError::persistence)
        })
        .await
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<bool> {
        // Identities and portfolios cascade; task and ledger references are
        // nulled by their foreign keys.
        run_in_transaction(&self.pool, EntityKind::User, move |connection| {
            let removed = diesel::delete(users::table.find(id.into_inner()))
                .execute(connection)
                .map_err(|err| translate_delete_error(err, EntityKind::User))?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl AuthIdentityRepository for PostgresAuthIdentityRepository {
    async fn add(&self, identity: NewAuthIdentity) -> RepositoryResult<AuthIdentity> {
        let password = identity.password();
        let row = NewAuthIdentityRow {
            user_id: identity.user_id().into_inner(),
            provider: identity.provider().as_str().to_owned(),
            subject: identity.subject().as_str().to_owned(),
            email: identity.email().map(str::to_owned),
            email_verified: identity.email_verified(),
            password_hash: password.map(|credential| credential.hash().to_owned()),
            password_hash_method: password.map(|credential| credential.method().to_owned()),
            password_updated_at: password.map(|_| identity.created_at()),
            created_at: identity.created_at(),
            updated_at: identity.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(auth_identities::table)
                .values(&row)
                .returning(AuthIdentityRow::as_returning())
                .get_result(connection)
                .map_err(|err| translate_write_error(err, EntityKind::AuthIdentity))
                .and_then(row_to_identity)
        })
        .await
    }

    async fn find_by_provider_subject(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<AuthIdentity>> {
        let provider_name = provider.as_str().to_owned();
        let subject_value = subject.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            auth_identities::table
                .filter(auth_identities::provider.eq(provider_name))
                .filter(auth_identities::subject.eq(subject_value))
                .select(AuthIdentityRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_identity)
                .transpose()
        })
        .await
    }

    async fn find_user_by_identity(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<User>> {
        let provider_name = provider.as_str().to_owned();
        let subject_value = subject.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            auth_identities::table
                .inner_join(users::table)
                .filter(auth_identities::provider.eq(provider_name))
                .filter(auth_identities::subject.eq(subject_value))
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<AuthIdentity>> {
        run_blocking(&self.pool, move |connection| {
            auth_identities::table
                .filter(auth_identities::user_id.eq(user_id.into_inner()))
                .order(auth_identities::id.asc())
                .select(AuthIdentityRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_identity)
                .collect()
        })
        .await
    }

    async fn touch_last_login(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<AuthIdentity> {
        let key = format!("{provider}:{subject}");
        let provider_name = provider.as_str().to_owned();
        let subject_value = subject.as_str().to_owned();
        run_in_transaction(&self.pool, EntityKind::AuthIdentity, move |connection| {
            diesel::update(
                auth_identities::table
                    .filter(auth_identities::provider.eq(provider_name))
                    .filter(auth_identities::subject.eq(subject_value)),
            )
            .set(auth_identities::last_login_at.eq(now))
            .returning(AuthIdentityRow::as_returning())
            .get_result(connection)
            .optional()
            .map_err(|err| translate_write_error(err, EntityKind::AuthIdentity))?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::AuthIdentity, key))
            .and_then(row_to_identity)
        })
        .await
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
        let key = format!("{user_id}:{provider}");
        let provider_name = provider.as_str().to_owned();
        let replaces_password = patch.password.is_some();
        let changeset = AuthIdentityChangeset {
            email: patch.email.clone(),
            email_verified: patch.email_verified,
            password_hash: patch
                .password
                .as_ref()
                .map(|credential| credential.hash().to_owned()),
            password_hash_method: patch
                .password
                .as_ref()
                .map(|credential| credential.method().to_owned()),
        };
        run_in_transaction(&self.pool, EntityKind::AuthIdentity, move |connection| {
            let target = auth_identities::table
                .filter(auth_identities::user_id.eq(user_id.into_inner()))
                .filter(auth_identities::provider.eq(provider_name));
            let updated = diesel::update(target.clone())
                .set((&changeset, auth_identities::updated_at.eq(now)))
                .returning(AuthIdentityRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::AuthIdentity))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::AuthIdentity, key))?;
            if !replaces_password {
                return row_to_identity(updated);
            }
            diesel::update(target)
                .set(auth_identities::password_updated_at.eq(now))
                .returning(AuthIdentityRow::as_returning())
                .get_result(connection)
                .map_err(|err| translate_write_error(err, EntityKind::AuthIdentity))
                .and_then(row_to_identity)
        })
        .await
    }

    async fn delete(&self, id: AuthIdentityId) -> RepositoryResult<u64> {
        run_in_transaction(&self.pool, EntityKind::AuthIdentity, move |connection| {
            let removed = diesel::delete(auth_identities::table.find(id.value()))
                .execute(connection)
                .map_err(|err| translate_delete_error(err, EntityKind::AuthIdentity))?;
            u64::try_from(removed).map_err(RepositoryError::persistence)
        })
        .await
    }
}

#[async_trait]
impl PortfolioRepository for PostgresPortfolioRepository {
    async fn create(&self, portfolio: NewPortfolio) -> RepositoryResult<Portfolio> {
        let row = NewPortfolioRow {
            user_id: portfolio.user_id().into_inner(),
            display_name: portfolio.display_name().as_str().to_owned(),
            created_at: portfolio.created_at(),
            updated_at: portfolio.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(user_portfolios::table)
                .values(&row)
                .returning(PortfolioRow::as_returning())
                .get_result(connection)
                .map_err(|err| translate_write_error(err, EntityKind::Portfolio))
                .and_then(row_to_portfolio)
        })
        .await
    }

    async fn find_by_id(&self, id: PortfolioId) -> RepositoryResult<Option<Portfolio>> {
        run_blocking(&self.pool, move |connection| {
            user_portfolios::table
                .find(id.value())
                .select(PortfolioRow::as_select())
                .first(connection)
                .optional()
                .map_err(read_error)?
                .map(row_to_portfolio)
                .transpose()
        })
        .await
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Portfolio>> {
        run_blocking(&self.pool, move |connection| {
            user_portfolios::table
                .filter(user_portfolios::user_id.eq(user_id.into_inner()))
                .order(user_portfolios::id.asc())
                .select(PortfolioRow::as_select())
                .load(connection)
                .map_err(read_error)?
                .into_iter()
                .map(row_to_portfolio)
                .collect()
        })
        .await
    }

    async fn update_partial(
        &self,
        id: PortfolioId,
        patch: &PortfolioPatch,
    ) -> RepositoryResult<Portfolio> {
        let Some(display_name) = &patch.display_name else {
            return Err(RepositoryError::empty_patch(EntityKind::Portfolio));
        };
        let new_name = display_name.as_str().to_owned();
        run_in_transaction(&self.pool, EntityKind::Portfolio, move |connection| {
            diesel::update(user_portfolios::table.find(id.value()))
                .set((
                    user_portfolios::display_name.eq(new_name),
                    user_portfolios::updated_at.eq(now),
                ))
                .returning(PortfolioRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(|err| translate_write_error(err, EntityKind::Portfolio))?
                .ok_or_else(|| RepositoryError::not_found(EntityKind::Portfolio, id))
                .and_then(row_to_portfolio)
        })
        .await
    }
}

fn row_to_user(row: UserRow) -> RepositoryResult<User> {
    Ok(User::from_persisted(PersistedUserData {
        id: UserId::from_uuid(row.id),
        username: Username::new(row.username).map_err(RepositoryError::persistence)?,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_identity(row: AuthIdentityRow) -> RepositoryResult<AuthIdentity> {
    let AuthIdentityRow {
        id,
        user_id,
        provider,
        subject,
        email,
        email_verified,
        password_hash,
        password_hash_method,
        password_updated_at,
        last_login_at,
        created_at,
        updated_at,
    } = row;
    let password = match (password_hash, password_hash_method) {
        (Some(hash), Some(method)) => {
            Some(PasswordCredential::new(hash, method).map_err(RepositoryError::persistence)?)
        }
        _ => None,
    };
    Ok(AuthIdentity::from_persisted(PersistedAuthIdentityData {
        id: AuthIdentityId::new(id),
        user_id: UserId::from_uuid(user_id),
        provider: AuthProvider::new(provider).map_err(RepositoryError::persistence)?,
        subject: AuthSubject::new(subject).map_err(RepositoryError::persistence)?,
        email,
        email_verified,
        password,
        password_updated_at,
        last_login_at,
        created_at,
        updated_at,
    }))
}

fn row_to_portfolio(row: PortfolioRow) -> RepositoryResult<Portfolio> {
    Ok(Portfolio::from_persisted(PersistedPortfolioData {
        id: PortfolioId::new(row.id),
        user_id: UserId::from_uuid(row.user_id),
        display_name: DisplayName::new(row.display_name).map_err(RepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
