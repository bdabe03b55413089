//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod board;
pub mod dns;
pub mod panel;

pub use board::SubscriptionBoard;
pub use dns::DnsResolver;
pub use panel::{PanelClient, PanelSession};
