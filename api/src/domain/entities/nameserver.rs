//! Nameserver addresses as written in Clash `nameserver-policy` entries

use std::net::{IpAddr, SocketAddr};

use reqwest::Url;

use crate::error::ResolveError;

pub const DNS_PORT: u16 = 53;
pub const DNS_OVER_TLS_PORT: u16 = 853;

/// A nameserver that can answer plain A queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nameserver {
    Udp { host: String, port: u16 },
    Tcp { host: String, port: u16 },
    /// DNS-over-TLS (RFC 7858)
    Tls { host: String, port: u16 },
    /// DNS-over-HTTPS endpoint (RFC 8484)
    Https { url: String },
}

impl Nameserver {
    /// Normalised form used as a cache key: trimmed and lowercased.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let server = Self::normalize(raw);

        if server.starts_with("rcode://") {
            return Err(ResolveError::Rcode(server));
        }
        if server == "system" || server.starts_with("system://") || server.starts_with("dhcp://")
        {
            return Err(ResolveError::System(server));
        }

        if !server.contains("://") {
            return parse_bare(&server);
        }

        let url = Url::parse(&server).map_err(|_| ResolveError::InvalidAddress(server.clone()))?;
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ResolveError::InvalidAddress(server.clone()))?
            .to_string();
        let port = url.port();

        match url.scheme() {
            "udp" => Ok(Nameserver::Udp {
                host,
                port: port.unwrap_or(DNS_PORT),
            }),
            "tcp" => Ok(Nameserver::Tcp {
                host,
                port: port.unwrap_or(DNS_PORT),
            }),
            "tls" => Ok(Nameserver::Tls {
                host,
                port: port.unwrap_or(DNS_OVER_TLS_PORT),
            }),
            "https" => Ok(Nameserver::Https { url: server }),
            other => Err(ResolveError::UnsupportedProtocol(other.to_string())),
        }
    }
}

impl std::str::FromStr for Nameserver {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Nameserver::parse(s)
    }
}

/// `host`, `host:port`, a bare IP or `[v6]:port`, all over UDP.
fn parse_bare(server: &str) -> Result<Nameserver, ResolveError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(Nameserver::Udp {
            host: addr.ip().to_string(),
            port: addr.port(),
        });
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(Nameserver::Udp {
            host: ip.to_string(),
            port: DNS_PORT,
        });
    }

    let (host, port) = match server.split_once(':') {
        Some((host, port)) => {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ResolveError::InvalidPort(server.to_string()))?;
            (host.trim(), port)
        }
        None => (server, DNS_PORT),
    };

    if host.is_empty() {
        return Err(ResolveError::InvalidAddress(server.to_string()));
    }

    Ok(Nameserver::Udp {
        host: host.to_string(),
        port,
    })
}
