//! Test utilities
//!
//! Hand-written port mocks that record their calls, plus YAML and app-state
//! fixtures shared by unit and router tests.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
