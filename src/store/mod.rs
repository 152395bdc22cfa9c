//! Shared persistence plumbing for every bounded context.
//!
//! Both adapters expose one transaction-scope helper that the per-entity
//! repositories compose into:
//!
//! - [`memory::MemoryDatabase::transaction`] runs a closure against a private
//!   copy of the tables and publishes it only when the closure succeeds.
//! - [`postgres::run_in_transaction`] runs a closure inside a Diesel
//!   transaction on a pooled connection off the async executor.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{ConflictReason, EntityKind, RepositoryError, RepositoryResult};
pub use memory::MemoryDatabase;
