//! DNS resolver port trait

use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::ResolveError;

#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// IPv4 addresses of `domain` as answered by `nameserver`.
    ///
    /// `nameserver` uses Clash notation (`8.8.8.8`, `tcp://1.1.1.1`, `https://...`).
    /// An empty answer is an error.
    async fn resolve_ipv4(
        &self,
        nameserver: &str,
        domain: &str,
    ) -> Result<Vec<Ipv4Addr>, ResolveError>;
}
