//! Domain layer
//!
//! Contains the board model and the traits boards depend on.
//! - `entities`: Board descriptors, parameters and subscription content
//! - `ports`: Trait definitions for boards and the upstream services they call

pub mod entities;
pub mod ports;
