//! Adapter implementations of the organization ports.

pub mod memory;
pub mod postgres;
