//! Port contracts for task workflow management.
//!
//! Ports define infrastructure-agnostic interfaces used by the task workflow service.

pub mod repository;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
