//! `PostgreSQL` adapters for users, identities and portfolios.

mod models;
mod repository;

pub use repository::{
    PostgresAuthIdentityRepository, PostgresPortfolioRepository, PostgresUserRepository,
};
