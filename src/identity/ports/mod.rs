//! Port contracts for users, authentication identities and portfolios.

pub mod repository;

pub use repository::{AuthIdentityRepository, PortfolioRepository, UserRepository};
