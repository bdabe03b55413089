//! Nameserver-directed DNS resolver
//!
//! Sends A queries to the exact nameserver a Clash policy names, over UDP
//! (falling back to TCP on truncation), TCP, DNS-over-TLS or DNS-over-HTTPS.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio_rustls::TlsConnector;

use super::codec::{decode_a_records, encode_query, WireError};
use crate::domain::entities::Nameserver;
use crate::domain::ports::DnsResolver;
use crate::error::ResolveError;

const DNS_MESSAGE: &str = "application/dns-message";
const UDP_BUFFER_LEN: usize = 4096;

type CacheKey = (String, String);

/// Failure of a single query exchange
#[derive(Debug, Error)]
enum ExchangeError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("DoH server returned status {0}")]
    HttpStatus(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not resolve nameserver host {0}")]
    UnknownHost(String),

    #[error("invalid TLS server name {0}")]
    ServerName(String),
}

/// Resolver that queries the nameserver it is told to, caching answers for the process lifetime
pub struct NameserverResolver {
    http: Client,
    tls: TlsConnector,
    timeout: Duration,
    cache: RwLock<HashMap<CacheKey, Vec<Ipv4Addr>>>,
}

impl NameserverResolver {
    /// `tls` is used for `tls://` nameservers. `timeout` bounds each lookup,
    /// nameserver host resolution included.
    pub fn new(http: Client, tls: Arc<ClientConfig>, timeout: Duration) -> Self {
        Self {
            http,
            tls: TlsConnector::from(tls),
            timeout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<Ipv4Addr>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remember(&self, key: CacheKey, addrs: Vec<Ipv4Addr>) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, addrs);
    }

    async fn exchange(
        &self,
        nameserver: &Nameserver,
        domain: &str,
    ) -> Result<Vec<Ipv4Addr>, ExchangeError> {
        match nameserver {
            Nameserver::Udp { host, port } => {
                let addr = lookup(host, *port).await?;
                match self.query_udp(addr, domain).await {
                    Err(ExchangeError::Wire(WireError::Truncated)) => {
                        tracing::debug!(%addr, domain, "udp answer truncated, retrying over tcp");
                        self.query_tcp(addr, domain).await
                    }
                    other => other,
                }
            }
            Nameserver::Tcp { host, port } => {
                let addr = lookup(host, *port).await?;
                self.query_tcp(addr, domain).await
            }
            Nameserver::Tls { host, port } => {
                let addr = lookup(host, *port).await?;
                self.query_tls(host, addr, domain).await
            }
            Nameserver::Https { url } => self.query_https(url, domain).await,
        }
    }

    async fn query_udp(&self, addr: SocketAddr, domain: &str) -> Result<Vec<Ipv4Addr>, ExchangeError> {
        let id = rand::random::<u16>();
        let query = encode_query(id, domain)?;

        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        socket.send(&query).await?;

        let mut response = vec![0u8; UDP_BUFFER_LEN];
        let len = socket.recv(&mut response).await?;
        response.truncate(len);

        Ok(decode_a_records(id, &response)?)
    }

    async fn query_tcp(&self, addr: SocketAddr, domain: &str) -> Result<Vec<Ipv4Addr>, ExchangeError> {
        let id = rand::random::<u16>();
        let query = encode_query(id, domain)?;

        let mut stream = TcpStream::connect(addr).await?;
        let response = exchange_framed(&mut stream, &query).await?;

        Ok(decode_a_records(id, &response)?)
    }

    /// RFC 7858: the TCP framing inside a TLS session, verified against `host`.
    async fn query_tls(
        &self,
        host: &str,
        addr: SocketAddr,
        domain: &str,
    ) -> Result<Vec<Ipv4Addr>, ExchangeError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ExchangeError::ServerName(host.to_string()))?;
        let id = rand::random::<u16>();
        let query = encode_query(id, domain)?;

        let stream = TcpStream::connect(addr).await?;
        let mut stream = self.tls.connect(server_name, stream).await?;
        let response = exchange_framed(&mut stream, &query).await?;

        Ok(decode_a_records(id, &response)?)
    }

    /// RFC 8484 POST. The query id is 0 so responses stay cacheable by HTTP intermediaries.
    async fn query_https(&self, url: &str, domain: &str) -> Result<Vec<Ipv4Addr>, ExchangeError> {
        let query = encode_query(0, domain)?;

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, DNS_MESSAGE)
            .header(ACCEPT, DNS_MESSAGE)
            .body(query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ExchangeError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(decode_a_records(0, &body)?)
    }

    async fn timed<F, T>(&self, fut: F) -> Result<T, ExchangeError>
    where
        F: std::future::Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ExchangeError::Timeout(self.timeout))
    }
}

/// One length-prefixed query and answer over a stream transport
async fn exchange_framed<S>(stream: &mut S, query: &[u8]) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = (query.len() as u16).to_be_bytes().to_vec();
    framed.extend_from_slice(query);
    stream.write_all(&framed).await?;
    stream.flush().await?;

    let mut len = [0u8; 2];
    stream.read_exact(&mut len).await?;
    let mut response = vec![0u8; u16::from_be_bytes(len) as usize];
    stream.read_exact(&mut response).await?;
    Ok(response)
}

async fn lookup(host: &str, port: u16) -> Result<SocketAddr, ExchangeError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| ExchangeError::UnknownHost(host.to_string()))
}

#[async_trait]
impl DnsResolver for NameserverResolver {
    async fn resolve_ipv4(
        &self,
        nameserver: &str,
        domain: &str,
    ) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let key = (Nameserver::normalize(nameserver), domain.to_string());
        if let Some(addrs) = self.cached(&key) {
            return Ok(addrs);
        }

        let parsed = Nameserver::parse(nameserver)?;
        let addrs = self
            .timed(self.exchange(&parsed, domain))
            .await
            .and_then(|answer| answer)
            .map_err(|e| {
                tracing::warn!(nameserver = %key.0, domain, error = %e, "dns query failed");
                ResolveError::Query {
                    domain: domain.to_string(),
                    server: key.0.clone(),
                    reason: e.to_string(),
                }
            })?;

        if addrs.is_empty() {
            return Err(ResolveError::NoRecords {
                domain: domain.to_string(),
                server: key.0,
            });
        }

        self.remember(key, addrs.clone());
        Ok(addrs)
    }
}
