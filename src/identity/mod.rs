//! Users, their authentication identities and portfolios.
//!
//! A user may sign in through several providers; each `(provider, subject)`
//! pair maps to exactly one user. Deleting a user removes its identities and
//! portfolios and detaches it from tasks without touching the transition
//! ledger.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
