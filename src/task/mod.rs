//! Task workflow: tasks, their status ledger and the engine that moves them.
//!
//! The module follows the same hexagonal split as the other contexts:
//!
//! - Domain types and workflow rules in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The workflow engine in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
