//! `PostgreSQL` adapter for tasks and their ledger.

mod models;
mod repository;

pub use repository::PostgresTaskRepository;
