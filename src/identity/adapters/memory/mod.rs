//! In-memory adapters for users, identities and portfolios.

mod auth_identity;
mod portfolio;
mod user;

pub use auth_identity::InMemoryAuthIdentityRepository;
pub use portfolio::InMemoryPortfolioRepository;
pub use user::InMemoryUserRepository;
