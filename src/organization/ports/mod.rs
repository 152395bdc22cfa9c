//! Port contracts for organization, project and batch persistence.
//!
//! Ports define infrastructure-agnostic interfaces; every mutating call is a
//! single atomic unit in the backing store.

pub mod repository;

pub use repository::{BatchRepository, OrganizationRepository, ProjectRepository};
