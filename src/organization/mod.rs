//! Organization, project and batch management.
//!
//! Organizations own projects and projects own batches. Deleting any of them
//! is restricted while children exist, so workflow ancestry is never removed
//! destructively. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
