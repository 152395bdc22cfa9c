//! `PostgreSQL` adapters for organization, project and batch storage.

mod models;
mod repository;

pub use repository::{
    PostgresBatchRepository, PostgresOrganizationRepository, PostgresProjectRepository,
};
