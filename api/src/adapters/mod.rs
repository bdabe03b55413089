//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod dns;
pub mod panel;

pub use dns::{tls::platform_client_config, NameserverResolver};
pub use panel::XBoardPanelClient;
