//! DNS adapter
//!
//! Resolves proxy hostnames through the nameservers Clash policies name.

pub mod codec;
pub mod resolver;
pub mod tls;

pub use resolver::NameserverResolver;
