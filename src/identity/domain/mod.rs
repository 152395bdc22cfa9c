//! Domain model for users and authentication identities.

mod auth_identity;
mod error;
mod ids;
mod portfolio;
mod user;

pub use auth_identity::{
    AuthIdentity, AuthIdentityPatch, AuthProvider, AuthSubject, NewAuthIdentity,
    PasswordCredential, PersistedAuthIdentityData,
};
pub use error::IdentityDomainError;
pub use ids::{AuthIdentityId, PortfolioId, UserId};
pub use portfolio::{DisplayName, NewPortfolio, PersistedPortfolioData, Portfolio, PortfolioPatch};
pub use user::{PersistedUserData, User, UserPatch, Username};
