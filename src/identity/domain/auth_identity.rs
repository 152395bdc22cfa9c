//! Authentication identities linking provider accounts to users.
//!
//! Credential verification is handled elsewhere; a password credential is an
//! opaque hash plus the name of the scheme that produced it.

use super::{AuthIdentityId, IdentityDomainError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase identity provider name such as `password`, `google` or `github`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthProvider(String);

impl AuthProvider {
    /// Creates a validated provider name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyProvider`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyProvider);
        }
        Ok(Self(normalized))
    }

    /// Returns the provider as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-scoped account identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthSubject(String);

impl AuthSubject {
    /// Creates a validated subject.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptySubject`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptySubject);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored password hash together with the scheme that produced it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredential {
    hash: String,
    method: String,
}

impl PasswordCredential {
    /// Creates a credential from an already computed hash.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyPasswordCredential`] when either
    /// part is empty.
    pub fn new(
        hash: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<Self, IdentityDomainError> {
        let encoded = hash.into();
        let scheme = method.into().trim().to_owned();
        if encoded.is_empty() || scheme.is_empty() {
            return Err(IdentityDomainError::EmptyPasswordCredential);
        }
        Ok(Self {
            hash: encoded,
            method: scheme,
        })
    }

    /// Returns the encoded hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the hashing scheme name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("hash", &"<redacted>")
            .field("method", &self.method)
            .finish()
    }
}

/// Authentication identity before the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthIdentity {
    user_id: UserId,
    provider: AuthProvider,
    subject: AuthSubject,
    email: Option<String>,
    email_verified: bool,
    password: Option<PasswordCredential>,
    created_at: DateTime<Utc>,
}

impl NewAuthIdentity {
    /// Creates an identity for the user without email or password.
    #[must_use]
    pub fn new(
        user_id: UserId,
        provider: AuthProvider,
        subject: AuthSubject,
        clock: &impl Clock,
    ) -> Self {
        Self {
            user_id,
            provider,
            subject,
            email: None,
            email_verified: false,
            password: None,
            created_at: clock.utc(),
        }
    }

    /// Sets the email reported by the provider.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = verified;
        self
    }

    /// Sets the password credential.
    #[must_use]
    pub fn with_password(mut self, password: PasswordCredential) -> Self {
        self.password = Some(password);
        self
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &AuthProvider {
        &self.provider
    }

    /// Returns the provider subject.
    #[must_use]
    pub const fn subject(&self) -> &AuthSubject {
        &self.subject
    }

    /// Returns the email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the email was verified by the provider.
    #[must_use]
    pub const fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Returns the password credential, if any.
    #[must_use]
    pub const fn password(&self) -> Option<&PasswordCredential> {
        self.password.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completes the identity with its store-assigned identifier.
    #[must_use]
    pub fn into_identity(self, id: AuthIdentityId) -> AuthIdentity {
        let password_updated_at = self.password.as_ref().map(|_| self.created_at);
        AuthIdentity {
            id,
            user_id: self.user_id,
            provider: self.provider,
            subject: self.subject,
            email: self.email,
            email_verified: self.email_verified,
            password: self.password,
            password_updated_at,
            last_login_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Persisted authentication identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    id: AuthIdentityId,
    user_id: UserId,
    provider: AuthProvider,
    subject: AuthSubject,
    email: Option<String>,
    email_verified: bool,
    password: Option<PasswordCredential>,
    password_updated_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAuthIdentityData {
    /// Store-assigned identifier.
    pub id: AuthIdentityId,
    /// Owning user.
    pub user_id: UserId,
    /// Provider name.
    pub provider: AuthProvider,
    /// Provider subject.
    pub subject: AuthSubject,
    /// Email reported by the provider.
    pub email: Option<String>,
    /// Whether the email was verified.
    pub email_verified: bool,
    /// Stored password credential.
    pub password: Option<PasswordCredential>,
    /// When the password was last set.
    pub password_updated_at: Option<DateTime<Utc>>,
    /// Last successful sign-in.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an identity. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthIdentityPatch {
    /// New email; `Some(None)` clears it.
    pub email: Option<Option<String>>,
    /// New email verification flag.
    pub email_verified: Option<bool>,
    /// Replacement password credential.
    pub password: Option<PasswordCredential>,
}

impl AuthIdentityPatch {
    /// Returns `true` when the patch carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.email_verified.is_none() && self.password.is_none()
    }
}

impl AuthIdentity {
    /// Reconstructs an identity from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAuthIdentityData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            provider: data.provider,
            subject: data.subject,
            email: data.email,
            email_verified: data.email_verified,
            password: data.password,
            password_updated_at: data.password_updated_at,
            last_login_at: data.last_login_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the identity identifier.
    #[must_use]
    pub const fn id(&self) -> AuthIdentityId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &AuthProvider {
        &self.provider
    }

    /// Returns the provider subject.
    #[must_use]
    pub const fn subject(&self) -> &AuthSubject {
        &self.subject
    }

    /// Returns the email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the email was verified.
    #[must_use]
    pub const fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Returns the password credential, if any.
    #[must_use]
    pub const fn password(&self) -> Option<&PasswordCredential> {
        self.password.as_ref()
    }

    /// Returns when the password was last set.
    #[must_use]
    pub const fn password_updated_at(&self) -> Option<DateTime<Utc>> {
        self.password_updated_at
    }

    /// Returns the last successful sign-in time.
    #[must_use]
    pub const fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a successful sign-in.
    pub const fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    /// Applies a partial update and stamps `updated_at`.
    ///
    /// Replacing the password also stamps `password_updated_at`.
    pub fn apply_patch(&mut self, patch: &AuthIdentityPatch, at: DateTime<Utc>) {
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(verified) = patch.email_verified {
            self.email_verified = verified;
        }
        if let Some(password) = &patch.password {
            self.password = Some(password.clone());
            self.password_updated_at = Some(at);
        }
        self.updated_at = at;
    }
}
