use std::env;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// Interface to listen on
    pub host: String,
    pub port: u16,
    /// Timeout for panel API calls (login, subscribe info, unlock)
    pub api_timeout: Duration,
    /// Timeout for downloading the subscription itself
    pub fetch_timeout: Duration,
    /// Timeout for a single nameserver query
    pub dns_timeout: Duration,
    /// Emit JSON log lines instead of the compact format
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(3),
            json_logs: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            api_timeout: secs_var("API_TIMEOUT_SECS").unwrap_or(defaults.api_timeout),
            fetch_timeout: secs_var("FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch_timeout),
            dns_timeout: secs_var("DNS_TIMEOUT_SECS").unwrap_or(defaults.dns_timeout),
            json_logs: matches!(env::var("LOG_FORMAT").as_deref(), Ok("json")),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn secs_var(name: &str) -> Option<Duration> {
    parse_var::<u64>(name)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
