//! Annotatex workflow: persistence and task workflow core for an annotation
//! platform.
//!
//! Organizations own projects, projects own batches of tasks, and every task
//! moves through a status workflow recorded in an append-only transition
//! ledger. Users sign in through one or more identity providers.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`organization`]: Organizations, projects and batches
//! - [`identity`]: Users, authentication identities and portfolios
//! - [`task`]: Tasks, the transition ledger and the workflow engine
//! - [`store`]: Shared transaction scopes and the repository error taxonomy
//! - [`api`]: Request validation and dispatch into the workflow engine
//! - [`config`]: Environment-driven store configuration

mod ids;

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod organization;
pub mod store;
pub mod task;
