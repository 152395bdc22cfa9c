//! Step definitions and world for task workflow BDD scenarios.

mod given;
mod then;
pub mod world;
