//! Clash configuration rewriting
//!
//! Pins proxy servers to IP addresses, resolving each server through the
//! nameserver the configuration's own `dns.nameserver-policy` assigns to it.

use std::net::IpAddr;

use glob::Pattern;
use serde_yaml::{Mapping, Value};

use crate::domain::ports::DnsResolver;
use crate::error::TransformError;

/// Rewrite every proxy `server` that a nameserver policy covers to its first IPv4 address.
///
/// Servers that are already IP literals, or that no policy pattern matches, are left as is.
/// Key order of the document is preserved.
pub async fn pin_proxy_servers<R>(yaml: &str, resolver: &R) -> Result<String, TransformError>
where
    R: DnsResolver + ?Sized,
{
    let mut doc: Value = serde_yaml::from_str(yaml).map_err(TransformError::Parse)?;

    let policy = doc
        .get("dns")
        .and_then(|dns| dns.get("nameserver-policy"))
        .and_then(Value::as_mapping)
        .cloned()
        .ok_or(TransformError::MissingNameserverPolicy)?;

    let proxies = doc
        .get_mut("proxies")
        .and_then(Value::as_sequence_mut)
        .ok_or(TransformError::MissingProxies)?;

    for proxy in proxies.iter_mut() {
        let Some(server) = proxy
            .get("server")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        if server.parse::<IpAddr>().is_ok() {
            continue;
        }

        let Some(nameserver) = nameserver_for(&policy, &server) else {
            continue;
        };

        let ips = resolver.resolve_ipv4(&nameserver, &server).await?;
        let (Some(ip), Some(entry)) = (ips.first(), proxy.as_mapping_mut()) else {
            continue;
        };

        tracing::debug!(%server, %nameserver, %ip, "pinned proxy server");
        entry.insert(Value::from("server"), Value::from(ip.to_string()));
    }

    serde_yaml::to_string(&doc).map_err(TransformError::Serialize)
}

/// Nameserver of the first policy entry whose pattern matches `domain`.
///
/// A policy value may be a single nameserver or a list; for lists the first entry is used.
fn nameserver_for(policy: &Mapping, domain: &str) -> Option<String> {
    policy.iter().find_map(|(pattern, target)| {
        if !policy_matches(pattern.as_str()?, domain) {
            return None;
        }
        match target {
            Value::String(server) => Some(server.clone()),
            Value::Sequence(servers) => servers.iter().find_map(Value::as_str).map(str::to_owned),
            _ => None,
        }
    })
}

/// Clash domain wildcards: `+.example.com` and `.example.com` cover every subdomain
/// level of `example.com` but not `example.com` itself. `*` spans any run of
/// characters, dots included.
fn policy_matches(pattern: &str, domain: &str) -> bool {
    let glob = if pattern.starts_with("+.") || pattern.starts_with('.') {
        format!("*{}", &pattern[1..])
    } else {
        pattern.to_string()
    };

    Pattern::new(&glob)
        .map(|p| p.matches(domain))
        .unwrap_or(false)
}
