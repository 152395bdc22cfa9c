//! Repository ports for the identity context.

use crate::identity::domain::{
    AuthIdentity, AuthIdentityId, AuthIdentityPatch, AuthProvider, AuthSubject, NewAuthIdentity,
    NewPortfolio, Portfolio, PortfolioId, PortfolioPatch, User, UserId, UserPatch, Username,
};
use crate::store::RepositoryResult;
use async_trait::async_trait;

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the username is taken.
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Finds a user by username.
    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>>;

    /// Returns every user ordered by username.
    async fn list_all(&self) -> RepositoryResult<Vec<User>>;

    /// Returns active users ordered by username.
    async fn list_active(&self) -> RepositoryResult<Vec<User>>;

    /// Applies a partial update and returns the updated user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch, `NotFound` when the user does
    /// not exist and `Conflict` when the new username is taken.
    async fn update_partial(&self, id: UserId, patch: &UserPatch) -> RepositoryResult<User>;

    /// Sets the active flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user does not exist.
    async fn set_active(&self, id: UserId, active: bool) -> RepositoryResult<User>;

    /// Re-enables a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user does not exist.
    async fn activate(&self, id: UserId) -> RepositoryResult<User> {
        self.set_active(id, true).await
    }

    /// Disables a user without removing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user does not exist.
    async fn deactivate(&self, id: UserId) -> RepositoryResult<User> {
        self.set_active(id, false).await
    }

    /// Marks every listed user inactive, returning how many rows matched.
    async fn bulk_deactivate(&self, ids: &[UserId]) -> RepositoryResult<u64>;

    /// Permanently removes a user.
    ///
    /// Identities and portfolios go with the user; task ownership and ledger
    /// references to the user are cleared. Returns `false` when the user did
    /// not exist.
    async fn delete(&self, id: UserId) -> RepositoryResult<bool>;
}

/// Authentication identity persistence contract.
#[async_trait]
pub trait AuthIdentityRepository: Send + Sync {
    /// Links a provider account to a user.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the `(provider, subject)` pair is taken or the
    /// user does not exist.
    async fn add(&self, identity: NewAuthIdentity) -> RepositoryResult<AuthIdentity>;

    /// Finds an identity by its provider account.
    async fn find_by_provider_subject(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<AuthIdentity>>;

    /// Resolves the user behind a provider account.
    async fn find_user_by_identity(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<Option<User>>;

    /// Returns a user's identities ordered by creation sequence.
    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<AuthIdentity>>;

    /// Records a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no identity matches.
    async fn touch_last_login(
        &self,
        provider: &AuthProvider,
        subject: &AuthSubject,
    ) -> RepositoryResult<AuthIdentity>;

    /// Applies a partial update to the user's identity for `provider`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch and `NotFound` when the user
    /// has no identity for the provider.
    async fn update_partial(
        &self,
        user_id: UserId,
        provider: &AuthProvider,
        patch: &AuthIdentityPatch,
    ) -> RepositoryResult<AuthIdentity>;

    /// Removes an identity, returning the number of rows removed.
    async fn delete(&self, id: AuthIdentityId) -> RepositoryResult<u64>;
}

/// Portfolio persistence contract.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Stores a new portfolio.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the user does not exist.
    async fn create(&self, portfolio: NewPortfolio) -> RepositoryResult<Portfolio>;

    /// Finds a portfolio by identifier.
    async fn find_by_id(&self, id: PortfolioId) -> RepositoryResult<Option<Portfolio>>;

    /// Returns a user's portfolios ordered by creation sequence.
    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Portfolio>>;

    /// Applies a partial update and returns the updated portfolio.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty patch and `NotFound` when the
    /// portfolio does not exist.
    async fn update_partial(
        &self,
        id: PortfolioId,
        patch: &PortfolioPatch,
    ) -> RepositoryResult<Portfolio>;
}
