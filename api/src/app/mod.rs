//! Application layer
//!
//! Contains the board registry, the boards themselves and the content
//! transforms they share.

pub mod boards;
pub mod clash;
pub mod registry;

pub use registry::BoardRegistry;
